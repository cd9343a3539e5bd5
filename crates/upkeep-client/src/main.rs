/*
[INPUT]:  CLI arguments, YAML configuration file, UPKEEP__* environment
[OUTPUT]: One operator command run against the maintenance API
[POS]:    Binary entry point
[UPDATE]: When changing CLI commands, startup flow, or logging setup
*/

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use upkeep_adapter::TaskKind;
use upkeep_client::Settings;
use upkeep_client::config::DEFAULT_CONFIG_FILE;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "upkeep", version, about = "Maintenance task client")]
struct Cli {
    /// Settings file (defaults to ./upkeep.yaml when present)
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    /// Overrides `logging.level`
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and keep the session token
    Login {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the session token
    Logout,
    /// List equipment
    Equipment,
    /// Select the equipment to work on
    Select { equipment_id: String },
    /// Show tasks of the selected equipment, most urgent first
    Tasks {
        #[arg(long, value_enum, default_value_t = KindArg::Counter)]
        kind: KindArg,
    },
    /// Mark a task as done
    Complete {
        task_id: String,
        #[arg(long)]
        notes: Option<String>,
        /// Hour-counter reading taken on site
        #[arg(long = "counter", value_name = "HOURS")]
        counter: Option<f64>,
    },
    /// Report a failure through the classification wizard
    Report,
    /// Write a settings template
    InitConfig {
        #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Counter,
    Date,
}

impl From<KindArg> for TaskKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Counter => TaskKind::CounterBased,
            KindArg::Date => TaskKind::DateBased,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    if let Command::InitConfig { output } = &args.command {
        let _guard = init_tracing(args.log_level.as_deref().unwrap_or("warn"), None)?;
        return cli::init::run_init(output);
    }

    let settings = Settings::load(args.config_path.as_deref()).context("load settings")?;
    let level = args.log_level.as_deref().unwrap_or(&settings.logging.level);
    let _guard = init_tracing(level, settings.logging.dir.as_deref())?;
    debug!(
        base_url = %settings.api.base_url,
        session = %settings.session.path.display(),
        "settings loaded"
    );

    let mut ctx = cli::commands::Context::open(settings)
        .await
        .context("open session")?;

    match args.command {
        Command::Login { username, password } => ctx.login(username, password).await,
        Command::Logout => ctx.logout().await,
        Command::Equipment => ctx.list_equipment().await,
        Command::Select { equipment_id } => ctx.select(&equipment_id).await,
        Command::Tasks { kind } => ctx.show_tasks(kind.into()).await,
        Command::Complete {
            task_id,
            notes,
            counter,
        } => ctx.complete(task_id, notes, counter).await,
        Command::Report => cli::interactive::run_report(&mut ctx).await,
        Command::InitConfig { output } => cli::init::run_init(&output),
    }?;

    debug!("command finished");
    Ok(())
}

/// Console logging to stderr, plus a daily rolling file when `log_dir` is set.
/// The returned guard flushes the file writer and must outlive the command.
fn init_tracing(level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(level).context("invalid log level")?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "upkeep.log");
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            builder
                .with_ansi(false)
                .with_writer(std::io::stderr.and(file_writer))
                .try_init()
                .map_err(|err| anyhow!(err))
                .context("initialize tracing subscriber")?;
            Ok(Some(guard))
        }
        None => {
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|err| anyhow!(err))
                .context("initialize tracing subscriber")?;
            Ok(None)
        }
    }
}
