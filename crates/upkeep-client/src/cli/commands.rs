/*
[INPUT]:  Settings, persisted session, operator command arguments
[OUTPUT]: Console output of equipment, tasks and completions
[POS]:    CLI command layer
[UPDATE]: When a command is added or its output changes
*/

use anyhow::{Context as _, Result, anyhow, bail};
use chrono::{Local, Utc};
use console::{Style, style};
use dialoguer::{Input, Password, theme::ColorfulTheme};
use std::sync::Arc;
use tracing::{info, warn};

use upkeep_adapter::{
    AuthManager, Equipment, TaskEntry, TaskKind, TaskSchedule, TokenData, UpkeepClient,
    UpkeepError,
};
use upkeep_client::state::SKIP_SHORTCUT_FLAG;
use upkeep_client::{
    CompletionError, CompletionRequest, Fetcher, JsonFileSessionStore, SessionCache, Settings,
    TaskBoard, TaskCompletionCoordinator, TaskView, UrgencyCalculator, UrgencyTier,
    last_updated_label,
};

/// Everything a command needs: settings, the persisted session and the API.
pub struct Context {
    pub settings: Settings,
    pub session: SessionCache,
    auth: AuthManager,
}

impl Context {
    pub async fn open(settings: Settings) -> Result<Self> {
        let store = JsonFileSessionStore::open(&settings.session.path)
            .await
            .with_context(|| format!("open session file {}", settings.session.path.display()))?;
        let session = SessionCache::load(Arc::new(store)).await?;

        let client =
            UpkeepClient::with_config_and_base_url(settings.client_config(), &settings.api.base_url)
                .context("create API client")?;
        let auth = AuthManager::new(client);
        if let Some(token) = session.token() {
            auth.token_manager()
                .set(TokenData::new(token.to_string(), None, None));
        }

        Ok(Self {
            settings,
            session,
            auth,
        })
    }

    /// Client carrying the session token.
    pub fn client(&self) -> Result<UpkeepClient> {
        self.auth.authenticated_client().map_err(|err| match err {
            UpkeepError::TokenExpired => anyhow!("session expired, run `upkeep login`"),
            UpkeepError::AuthRequired => anyhow!("not signed in, run `upkeep login`"),
            other => anyhow!(other),
        })
    }

    pub fn calculator(&self) -> UrgencyCalculator {
        UrgencyCalculator::new(self.settings.urgency_policy())
    }

    /// Session flag first, then the configured default.
    pub fn skip_enabled(&self) -> bool {
        self.session
            .feature_flag(SKIP_SHORTCUT_FLAG)
            .unwrap_or(self.settings.wizard.skip_enabled)
    }

    pub async fn login(&mut self, username: Option<String>, password: Option<String>) -> Result<()> {
        let theme = ColorfulTheme::default();
        let username = match username {
            Some(username) => username,
            None => Input::with_theme(&theme)
                .with_prompt("Username")
                .interact_text()?,
        };
        let password = match password {
            Some(password) => password,
            None => Password::with_theme(&theme)
                .with_prompt("Password")
                .interact()?,
        };

        let response = self
            .auth
            .login(&username, &password)
            .await
            .context("sign in")?;
        self.session.set_token(response.token).await?;

        println!("{} signed in as {}", style("✔").green(), style(&username).cyan());
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.auth.logout();
        self.session.clear_token().await?;
        println!("signed out");
        Ok(())
    }

    pub async fn list_equipment(&mut self) -> Result<()> {
        let client = self.client()?;
        let equipment = Fetcher::list_equipment(&client).await?;
        if equipment.is_empty() {
            println!("{}", style("No equipment found.").yellow());
            return Ok(());
        }

        let selected = self.session.selected_equipment_id();
        for item in &equipment {
            let marker = if Some(item.id.as_str()) == selected { "*" } else { " " };
            let counter = item
                .hour_counter
                .map(|hours| format!("{hours:.0} h"))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{marker} {:<12} {:<28} {:<12} {}",
                item.id,
                item.name,
                item.technical_id,
                style(counter).dim()
            );
        }
        Ok(())
    }

    pub async fn select(&mut self, equipment_id: &str) -> Result<()> {
        let client = self.client()?;
        let equipment = find_equipment(&client, equipment_id).await?;
        let name = equipment.name.clone();
        if self.session.select_equipment(equipment).await? {
            info!(equipment_id, "equipment selected");
        }
        println!("Selected {} ({})", style(name).cyan(), equipment_id);
        Ok(())
    }

    /// Fresh record of the selected equipment, kept in the session.
    pub async fn selected_equipment(&mut self, client: &UpkeepClient) -> Result<Equipment> {
        let Some(equipment_id) = self.session.selected_equipment_id().map(str::to_string) else {
            bail!("no equipment selected, run `upkeep select <equipment-id>`");
        };
        let equipment = find_equipment(client, &equipment_id).await?;
        self.session.select_equipment(equipment.clone()).await?;
        Ok(equipment)
    }

    pub async fn show_tasks(&mut self, kind: TaskKind) -> Result<()> {
        let client = self.client()?;
        let equipment = self.selected_equipment(&client).await?;

        let mut board = TaskBoard::new();
        board.load(&client, &equipment.id, kind).await?;
        self.print_equipment_header(&equipment);

        let calculator = self.calculator();
        let views = board.sorted_by_urgency(&equipment, Utc::now(), &calculator);
        if views.is_empty() {
            println!("{}", style("No tasks.").yellow());
            return Ok(());
        }
        for view in &views {
            print_task_row(view);
        }
        Ok(())
    }

    fn print_equipment_header(&self, equipment: &Equipment) {
        println!(
            "{} {}",
            style(&equipment.name).bold().cyan(),
            style(&equipment.technical_id).dim()
        );
        if let Some(hours) = equipment.hour_counter {
            let updated = self
                .session
                .last_counter_update(&equipment.id)
                .map(|update| {
                    format!(
                        " (last updated: {})",
                        last_updated_label(update.timestamp, Utc::now(), &Local)
                    )
                })
                .unwrap_or_default();
            println!("Hour counter: {hours:.0} h{updated}");
        }
        println!();
    }

    pub async fn complete(
        &mut self,
        task_id: String,
        notes: Option<String>,
        counter: Option<f64>,
    ) -> Result<()> {
        let client = self.client()?;
        let equipment = self.selected_equipment(&client).await?;

        let mut board = TaskBoard::new();
        for kind in [TaskKind::CounterBased, TaskKind::DateBased] {
            board.load(&client, &equipment.id, kind).await?;
            if board.get(&task_id).is_some() {
                break;
            }
        }

        let mut request = CompletionRequest::new(task_id.clone());
        request.notes = notes;
        request.counter_reading = counter;

        let mut coordinator = TaskCompletionCoordinator::new(Arc::new(client));
        match coordinator
            .complete(&mut board, &mut self.session, request)
            .await
        {
            Ok(outcome) => {
                println!("{} task {} completed", style("✔").green(), outcome.ack.task_id);
                if let Some(reading) = outcome.ack.counter_reading.or(counter) {
                    println!("Hour counter recorded: {reading:.0} h");
                }
                Ok(())
            }
            Err(CompletionError::AlreadyCompleted { task_id }) => {
                println!("{}", style(format!("Task {task_id} is already completed.")).yellow());
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "completion not applied");
                Err(err.into())
            }
        }
    }
}

async fn find_equipment(client: &UpkeepClient, equipment_id: &str) -> Result<Equipment> {
    Fetcher::list_equipment(client)
        .await?
        .into_iter()
        .find(|equipment| equipment.id == equipment_id)
        .ok_or_else(|| anyhow!("unknown equipment {equipment_id}"))
}

fn tier_style(tier: UrgencyTier) -> Style {
    match tier {
        UrgencyTier::High => Style::new().red().bold(),
        UrgencyTier::Medium => Style::new().yellow(),
        UrgencyTier::Low => Style::new().green(),
    }
}

fn print_task_row(view: &TaskView<'_>) {
    let id = view.id().unwrap_or("?");
    let (status, schedule) = match view.entry {
        TaskEntry::Valid(task) => {
            let status = if task.is_completed() { "done" } else { "open" };
            let schedule = match &task.schedule {
                TaskSchedule::CounterBased {
                    interval_counter_units,
                    ..
                } => format!("every {interval_counter_units:.0} h"),
                TaskSchedule::DateBased { due_at, .. } => {
                    format!("due {}", due_at.with_timezone(&Local).format("%d/%m/%Y"))
                }
            };
            (status, schedule)
        }
        TaskEntry::Malformed(bad) => ("?", format!("unreadable: {}", bad.reason)),
    };

    let urgency = &view.urgency;
    let tone = tier_style(urgency.tier());
    println!(
        "{:<10} {:<32} {:>4} {:>5} {:<20} {}",
        id,
        view.title(),
        status,
        tone.apply_to(format!("{:.0}%", urgency.progress * 100.0)),
        tone.apply_to(urgency.remaining_label()),
        style(schedule).dim()
    );
}
