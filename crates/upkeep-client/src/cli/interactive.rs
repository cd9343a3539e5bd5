/*
[INPUT]:  Operator choices via CLI prompts, taxonomy from the API
[OUTPUT]: Submitted failure report
[POS]:    CLI interactive flow - classification wizard
[UPDATE]: When wizard steps or navigation choices change
*/

use anyhow::{Result, bail};
use console::style;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use tracing::debug;

use upkeep_adapter::{MediaRef, Severity, UpkeepClient};
use upkeep_client::{
    ClassificationWizard, ReportDraft, SubmitError, ValidationError, WizardEvent, WizardStep,
};

use super::commands::Context;

/// What the operator picked on one wizard screen.
enum Choice {
    Item(usize),
    Keep,
    Back,
    Skip,
    Cancel,
}

pub async fn run_report(ctx: &mut Context) -> Result<()> {
    let theme = ColorfulTheme::default();
    let client = ctx.client()?;
    let equipment = ctx.selected_equipment(&client).await?;

    println!(
        "{} {}",
        style("Failure report for").bold(),
        style(&equipment.name).bold().cyan()
    );

    let mut wizard = ClassificationWizard::new(ctx.skip_enabled());
    wizard.load_subsystems(&client, &equipment.id).await?;
    if wizard.subsystems().is_empty() {
        println!("{}", style("No subsystems defined for this equipment.").yellow());
        return Ok(());
    }

    loop {
        let step = wizard.step();
        if step == WizardStep::Details {
            if details(&mut wizard, &client, &equipment.id, &theme).await? {
                return Ok(());
            }
            continue;
        }

        let (names, kept) = options(&wizard, step);
        let choice = choose(&theme, &wizard, step, &names, kept.as_deref())?;
        let event = match choice {
            Choice::Item(index) => select_event(&wizard, step, index),
            Choice::Keep => Some(WizardEvent::Forward),
            Choice::Back => Some(WizardEvent::Back),
            Choice::Skip => Some(WizardEvent::SkipToDetails),
            Choice::Cancel => {
                wizard.abandon();
                println!("{}", style("Report cancelled.").yellow());
                return Ok(());
            }
        };
        let Some(event) = event else {
            continue;
        };

        let subsystem_id = match &event {
            WizardEvent::SelectSubsystem(subsystem) => Some(subsystem.id.clone()),
            _ => None,
        };
        wizard.dispatch(event);
        if let Some(subsystem_id) = subsystem_id {
            wizard.load_functions(&client, &subsystem_id).await?;
        }
    }
}

/// Option names for `step` and the name of the choice still held there.
fn options(wizard: &ClassificationWizard, step: WizardStep) -> (Vec<String>, Option<String>) {
    let selection = wizard.selection();
    match step {
        WizardStep::Subsystem => (
            wizard.subsystems().iter().map(|s| s.name.clone()).collect(),
            selection.subsystem().map(|s| s.name.clone()),
        ),
        WizardStep::Function => (
            wizard.functions().iter().map(|f| f.name.clone()).collect(),
            selection.function().map(|f| f.name.clone()),
        ),
        WizardStep::FunctionalFailure => (
            wizard
                .functional_failure_options()
                .iter()
                .map(|ff| ff.name.clone())
                .collect(),
            selection.functional_failure().map(|ff| ff.name.clone()),
        ),
        WizardStep::FailureMode => (
            wizard
                .failure_mode_options()
                .iter()
                .map(|m| m.name.clone())
                .collect(),
            selection.failure_mode().map(|m| m.name.clone()),
        ),
        WizardStep::Details => (Vec::new(), None),
    }
}

fn choose(
    theme: &ColorfulTheme,
    wizard: &ClassificationWizard,
    step: WizardStep,
    names: &[String],
    kept: Option<&str>,
) -> Result<Choice> {
    let mut items: Vec<String> = names.to_vec();
    let mut extra = Vec::new();
    if let Some(kept) = kept {
        items.push(format!("Keep \"{kept}\""));
        extra.push(Choice::Keep);
    }
    if step > WizardStep::Subsystem {
        items.push("← Back".to_string());
        extra.push(Choice::Back);
    }
    if wizard.selection().can_skip_to_submit() {
        items.push("Skip to details →".to_string());
        extra.push(Choice::Skip);
    }
    items.push("Cancel".to_string());
    extra.push(Choice::Cancel);

    let prompt = format!("Step {}/5 - {}", step.number(), step.title());
    let picked = Select::with_theme(theme)
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact()?;

    if picked < names.len() {
        return Ok(Choice::Item(picked));
    }
    let mut extra = extra.into_iter();
    Ok(extra.nth(picked - names.len()).unwrap_or(Choice::Cancel))
}

fn select_event(wizard: &ClassificationWizard, step: WizardStep, index: usize) -> Option<WizardEvent> {
    match step {
        WizardStep::Subsystem => wizard
            .subsystems()
            .get(index)
            .cloned()
            .map(WizardEvent::SelectSubsystem),
        WizardStep::Function => wizard
            .functions()
            .get(index)
            .cloned()
            .map(WizardEvent::SelectFunction),
        WizardStep::FunctionalFailure => wizard
            .functional_failure_options()
            .get(index)
            .cloned()
            .map(WizardEvent::SelectFunctionalFailure),
        WizardStep::FailureMode => wizard
            .failure_mode_options()
            .get(index)
            .cloned()
            .map(WizardEvent::SelectFailureMode),
        WizardStep::Details => None,
    }
}

/// Details screen. Returns `true` once the report is accepted, `false` to go
/// back into the taxonomy steps.
async fn details(
    wizard: &mut ClassificationWizard,
    client: &UpkeepClient,
    equipment_id: &str,
    theme: &ColorfulTheme,
) -> Result<bool> {
    print_path(wizard);

    let description: String = Input::with_theme(theme)
        .with_prompt("Description (empty to go back)")
        .allow_empty(true)
        .interact_text()?;
    if description.trim().is_empty() {
        wizard.dispatch(WizardEvent::Back);
        return Ok(false);
    }

    let severities: Vec<&str> = Severity::ALL.iter().map(Severity::as_str).collect();
    let severity = Select::with_theme(theme)
        .with_prompt("Severity")
        .items(&severities)
        .default(1)
        .interact()?;

    let media: String = Input::with_theme(theme)
        .with_prompt("Media URIs (comma separated, optional)")
        .allow_empty(true)
        .interact_text()?;
    let media = media
        .split(',')
        .map(str::trim)
        .filter(|uri| !uri.is_empty())
        .map(|uri| MediaRef {
            uri: uri.to_string(),
            content_type: None,
        })
        .collect();

    let draft = ReportDraft::new(description, Severity::ALL[severity]).with_media(media);
    loop {
        match wizard.submit(client, equipment_id, draft.clone()).await {
            Ok(outcome) => {
                println!("\n{}", style("Report submitted.").bold().green());
                println!("Reference: {}", style(outcome.ack.id).cyan());
                return Ok(true);
            }
            Err(SubmitError::Validation(err)) => {
                println!("{}", style(err.to_string()).yellow());
                debug!(error = %err, "report not valid yet");
                if matches!(
                    err,
                    ValidationError::MissingSubsystem | ValidationError::MissingFunction
                ) {
                    wizard.dispatch(WizardEvent::Back);
                }
                return Ok(false);
            }
            Err(SubmitError::Service(err)) => {
                println!("{} {}", style("Submission failed:").red(), err);
                let retry = Confirm::with_theme(theme)
                    .with_prompt("Retry? (choices are kept)")
                    .default(err.is_retryable())
                    .interact()?;
                if !retry {
                    bail!("report not submitted: {err}");
                }
            }
        }
    }
}

fn print_path(wizard: &ClassificationWizard) {
    let path = wizard.selection().confirmed_path();
    let levels = [
        ("Subsystem", path.subsystem.map(|s| s.name.as_str())),
        ("Function", path.function.map(|f| f.name.as_str())),
        (
            "Functional failure",
            path.functional_failure.map(|ff| ff.name.as_str()),
        ),
        ("Failure mode", path.failure_mode.map(|m| m.name.as_str())),
    ];
    println!();
    for (label, name) in levels {
        println!(
            "  {:<20} {}",
            style(label).dim(),
            name.unwrap_or("(not specified)")
        );
    }
}
