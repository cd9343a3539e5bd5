/*
[INPUT]:  Operator events, taxonomy option lists from a Fetcher
[OUTPUT]: Classification selection state and assembled failure reports
[POS]:    Core - guided failure classification
[UPDATE]: When taxonomy levels, back-navigation or the shortcut rules change
*/

use chrono::Utc;
use tracing::{debug, info};
use upkeep_adapter::{
    FailureMode, FailureReport, Function, FunctionalFailure, MediaRef, ReportAck, Severity,
    Subsystem,
};
use uuid::Uuid;

use crate::error::{ServiceError, SubmitError, ValidationError};
use crate::sequence::{RequestSequence, RequestTicket};
use crate::services::{Fetcher, Submitter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Subsystem = 1,
    Function = 2,
    FunctionalFailure = 3,
    FailureMode = 4,
    Details = 5,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Subsystem => "Subsystem",
            WizardStep::Function => "Function",
            WizardStep::FunctionalFailure => "Functional failure",
            WizardStep::FailureMode => "Failure mode",
            WizardStep::Details => "Details",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    SelectSubsystem(Subsystem),
    SelectFunction(Function),
    SelectFunctionalFailure(FunctionalFailure),
    SelectFailureMode(FailureMode),
    Back,
    Forward,
    SkipToDetails,
    Reset,
}

impl WizardEvent {
    fn name(&self) -> &'static str {
        match self {
            WizardEvent::SelectSubsystem(_) => "select_subsystem",
            WizardEvent::SelectFunction(_) => "select_function",
            WizardEvent::SelectFunctionalFailure(_) => "select_functional_failure",
            WizardEvent::SelectFailureMode(_) => "select_failure_mode",
            WizardEvent::Back => "back",
            WizardEvent::Forward => "forward",
            WizardEvent::SkipToDetails => "skip_to_details",
            WizardEvent::Reset => "reset",
        }
    }
}

/// Taxonomy levels confirmed on the current path through the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedPath<'a> {
    pub subsystem: Option<&'a Subsystem>,
    pub function: Option<&'a Function>,
    pub functional_failure: Option<&'a FunctionalFailure>,
    pub failure_mode: Option<&'a FailureMode>,
}

/// Immutable wizard state. Every transition goes through [`reduce`].
///
/// `trail` lists the steps whose choice the operator confirmed, in order.
/// `Back` returns to the last of them, so a step skipped by the function
/// shortcut is never revisited on the way back. `Back` never clears a field;
/// `Forward` picks the kept choice up again.
///
/// [`reduce`]: ClassificationSelection::reduce
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationSelection {
    subsystem: Option<Subsystem>,
    function: Option<Function>,
    functional_failure: Option<FunctionalFailure>,
    failure_mode: Option<FailureMode>,
    step: WizardStep,
    skip_enabled: bool,
    trail: Vec<WizardStep>,
    skipped_from: Option<WizardStep>,
}

impl Default for ClassificationSelection {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ClassificationSelection {
    pub fn new(skip_enabled: bool) -> Self {
        Self {
            subsystem: None,
            function: None,
            functional_failure: None,
            failure_mode: None,
            step: WizardStep::Subsystem,
            skip_enabled,
            trail: Vec::new(),
            skipped_from: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn skip_enabled(&self) -> bool {
        self.skip_enabled
    }

    pub fn subsystem(&self) -> Option<&Subsystem> {
        self.subsystem.as_ref()
    }

    pub fn function(&self) -> Option<&Function> {
        self.function.as_ref()
    }

    pub fn functional_failure(&self) -> Option<&FunctionalFailure> {
        self.functional_failure.as_ref()
    }

    pub fn failure_mode(&self) -> Option<&FailureMode> {
        self.failure_mode.as_ref()
    }

    pub fn trail(&self) -> &[WizardStep] {
        &self.trail
    }

    /// True when the shortcut is currently offered.
    pub fn can_skip(&self) -> bool {
        self.skip_enabled && self.step < WizardStep::Details
    }

    /// True when skipping now would still leave a report that can be sent:
    /// subsystem and function are both on the confirmed path.
    pub fn can_skip_to_submit(&self) -> bool {
        let path = self.confirmed_path();
        self.can_skip() && path.subsystem.is_some() && path.function.is_some()
    }

    pub fn with_skip_enabled(mut self, skip_enabled: bool) -> Self {
        self.skip_enabled = skip_enabled;
        self
    }

    /// Apply one event. Events that make no sense in the current state
    /// return the state unchanged.
    pub fn reduce(self, event: WizardEvent) -> Self {
        let name = event.name();
        let from = self.step;
        match self.transition(event) {
            Ok(next) => {
                debug!(event = name, from = from.number(), to = next.step.number(), "wizard transition");
                next
            }
            Err(unchanged) => {
                debug!(event = name, step = from.number(), "wizard event ignored");
                unchanged
            }
        }
    }

    fn transition(mut self, event: WizardEvent) -> Result<Self, Self> {
        match event {
            WizardEvent::SelectSubsystem(subsystem) => {
                self.subsystem = Some(subsystem);
                self.function = None;
                self.functional_failure = None;
                self.failure_mode = None;
                self.confirm(WizardStep::Subsystem);
                self.step = WizardStep::Function;
            }
            WizardEvent::SelectFunction(function) => {
                if !self.confirmed(WizardStep::Subsystem) {
                    return Err(self);
                }
                self.function = Some(function);
                self.functional_failure = None;
                self.failure_mode = None;
                self.confirm(WizardStep::Function);
                self.step = self.after_function();
            }
            WizardEvent::SelectFunctionalFailure(functional_failure) => {
                if !self.confirmed(WizardStep::Function) {
                    return Err(self);
                }
                self.functional_failure = Some(functional_failure);
                self.failure_mode = None;
                self.confirm(WizardStep::FunctionalFailure);
                self.step = WizardStep::FailureMode;
            }
            WizardEvent::SelectFailureMode(failure_mode) => {
                if !self.confirmed(WizardStep::Function) {
                    return Err(self);
                }
                self.failure_mode = Some(failure_mode);
                self.confirm(WizardStep::FailureMode);
                self.step = WizardStep::Details;
            }
            WizardEvent::Back => {
                if let Some(origin) = self.skipped_from.take() {
                    self.step = origin;
                } else if let Some(previous) = self.trail.pop() {
                    self.step = previous;
                } else {
                    return Err(self);
                }
            }
            WizardEvent::Forward => {
                let current = self.step;
                let next = match current {
                    WizardStep::Subsystem if self.subsystem.is_some() => WizardStep::Function,
                    WizardStep::Function if self.function.is_some() => self.after_function(),
                    WizardStep::FunctionalFailure if self.functional_failure.is_some() => {
                        WizardStep::FailureMode
                    }
                    WizardStep::FailureMode if self.failure_mode.is_some() => WizardStep::Details,
                    _ => return Err(self),
                };
                self.confirm(current);
                self.step = next;
            }
            WizardEvent::SkipToDetails => {
                if !self.can_skip() {
                    return Err(self);
                }
                self.trail.retain(|step| *step < self.step);
                self.skipped_from = Some(self.step);
                self.step = WizardStep::Details;
            }
            WizardEvent::Reset => {
                return Ok(Self::new(self.skip_enabled));
            }
        }
        Ok(self)
    }

    /// Record `step` as confirmed, dropping anything confirmed at or below it
    /// on an earlier path.
    fn confirm(&mut self, step: WizardStep) {
        self.trail.retain(|confirmed| *confirmed < step);
        self.trail.push(step);
        self.skipped_from = None;
    }

    fn after_function(&self) -> WizardStep {
        let has_direct_modes = self
            .function
            .as_ref()
            .is_some_and(|function| !function.failure_modes.is_empty());
        if self.skip_enabled && has_direct_modes {
            WizardStep::FailureMode
        } else {
            WizardStep::FunctionalFailure
        }
    }

    fn confirmed(&self, step: WizardStep) -> bool {
        self.trail.contains(&step)
    }

    /// Choices that belong to the current path. A field left over from a
    /// branch the operator backed out of is not part of it.
    pub fn confirmed_path(&self) -> ConfirmedPath<'_> {
        ConfirmedPath {
            subsystem: self
                .subsystem
                .as_ref()
                .filter(|_| self.confirmed(WizardStep::Subsystem)),
            function: self
                .function
                .as_ref()
                .filter(|_| self.confirmed(WizardStep::Function)),
            functional_failure: self
                .functional_failure
                .as_ref()
                .filter(|_| self.confirmed(WizardStep::FunctionalFailure)),
            failure_mode: self
                .failure_mode
                .as_ref()
                .filter(|_| self.confirmed(WizardStep::FailureMode)),
        }
    }

    pub fn functional_failure_options(&self) -> &[FunctionalFailure] {
        self.function
            .as_ref()
            .map(|function| function.functional_failures.as_slice())
            .unwrap_or_default()
    }

    /// Failure modes offered at step 4: those of the confirmed functional
    /// failure, or the ones listed directly on the function.
    pub fn failure_mode_options(&self) -> &[FailureMode] {
        if let Some(functional_failure) = self.confirmed_path().functional_failure {
            return &functional_failure.failure_modes;
        }
        self.function
            .as_ref()
            .map(|function| function.failure_modes.as_slice())
            .unwrap_or_default()
    }
}

/// Free-text part of a failure report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDraft {
    pub description: String,
    pub severity: Severity,
    pub media: Vec<MediaRef>,
}

impl ReportDraft {
    pub fn new(description: impl Into<String>, severity: Severity) -> Self {
        Self {
            description: description.into(),
            severity,
            media: Vec::new(),
        }
    }

    pub fn with_media(mut self, media: Vec<MediaRef>) -> Self {
        self.media = media;
        self
    }
}

/// A validated report waiting for the submitter.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    ticket: RequestTicket,
    report: FailureReport,
}

impl PendingSubmission {
    pub fn report(&self) -> &FailureReport {
        &self.report
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub ack: ReportAck,
    /// False when the wizard moved on while the request was out, in which
    /// case the newer state was left alone.
    pub wizard_reset: bool,
}

/// Stateful shell around [`ClassificationSelection`]: option lists, request
/// tickets and the submit flow.
#[derive(Debug, Default)]
pub struct ClassificationWizard {
    selection: ClassificationSelection,
    subsystems: Vec<Subsystem>,
    functions: Vec<Function>,
    subsystem_requests: RequestSequence,
    function_requests: RequestSequence,
    submit_requests: RequestSequence,
}

impl ClassificationWizard {
    pub fn new(skip_enabled: bool) -> Self {
        Self {
            selection: ClassificationSelection::new(skip_enabled),
            ..Self::default()
        }
    }

    pub fn selection(&self) -> &ClassificationSelection {
        &self.selection
    }

    pub fn step(&self) -> WizardStep {
        self.selection.step()
    }

    pub fn set_skip_enabled(&mut self, skip_enabled: bool) {
        self.selection = std::mem::take(&mut self.selection).with_skip_enabled(skip_enabled);
    }

    /// Feed an operator event through the reducer. Changing the subsystem
    /// drops the function list of the old one; a reset retires any
    /// submission still in flight.
    pub fn dispatch(&mut self, event: WizardEvent) -> WizardStep {
        match &event {
            WizardEvent::SelectSubsystem(subsystem)
                if self.selection.subsystem().map(|s| &s.id) != Some(&subsystem.id) =>
            {
                self.functions.clear();
                self.function_requests.invalidate();
            }
            WizardEvent::Reset => {
                self.functions.clear();
                self.function_requests.invalidate();
                self.submit_requests.invalidate();
            }
            _ => {}
        }
        self.selection = std::mem::take(&mut self.selection).reduce(event);
        self.selection.step()
    }

    pub fn subsystems(&self) -> &[Subsystem] {
        &self.subsystems
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn functional_failure_options(&self) -> &[FunctionalFailure] {
        self.selection.functional_failure_options()
    }

    pub fn failure_mode_options(&self) -> &[FailureMode] {
        self.selection.failure_mode_options()
    }

    pub fn request_subsystems(&mut self) -> RequestTicket {
        self.subsystem_requests.issue()
    }

    pub fn apply_subsystems(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<Subsystem>, ServiceError>,
    ) -> Result<bool, ServiceError> {
        if !self.subsystem_requests.is_current(ticket) {
            debug!(ticket = ticket.value(), "discarding stale subsystem list");
            return Ok(false);
        }
        self.subsystems = result?;
        Ok(true)
    }

    pub async fn load_subsystems(
        &mut self,
        fetcher: &dyn Fetcher,
        equipment_id: &str,
    ) -> Result<bool, ServiceError> {
        let ticket = self.request_subsystems();
        let result = fetcher.list_subsystems(equipment_id).await;
        self.apply_subsystems(ticket, result)
    }

    pub fn request_functions(&mut self) -> RequestTicket {
        self.function_requests.issue()
    }

    pub fn apply_functions(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<Function>, ServiceError>,
    ) -> Result<bool, ServiceError> {
        if !self.function_requests.is_current(ticket) {
            debug!(ticket = ticket.value(), "discarding stale function list");
            return Ok(false);
        }
        self.functions = result?;
        Ok(true)
    }

    pub async fn load_functions(
        &mut self,
        fetcher: &dyn Fetcher,
        subsystem_id: &str,
    ) -> Result<bool, ServiceError> {
        let ticket = self.request_functions();
        let result = fetcher.list_functions(subsystem_id).await;
        self.apply_functions(ticket, result)
    }

    /// Validate the selection and the draft and assemble the report. Nothing
    /// is sent; a validation failure leaves the wizard as it was.
    pub fn begin_submit(
        &mut self,
        equipment_id: &str,
        draft: ReportDraft,
    ) -> Result<PendingSubmission, ValidationError> {
        if self.selection.step() != WizardStep::Details {
            return Err(ValidationError::NotAtDetails);
        }
        let path = self.selection.confirmed_path();
        let subsystem = path.subsystem.ok_or(ValidationError::MissingSubsystem)?;
        let function = path.function.ok_or(ValidationError::MissingFunction)?;
        let description = draft.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }

        let report = FailureReport {
            client_ref: Uuid::new_v4(),
            equipment_id: equipment_id.to_string(),
            subsystem_id: subsystem.id.clone(),
            function_id: function.id.clone(),
            functional_failure_id: path.functional_failure.map(|ff| ff.id.clone()),
            failure_mode_id: path.failure_mode.map(|mode| mode.id.clone()),
            description: description.to_string(),
            severity: draft.severity,
            media: draft.media,
            reported_at: Utc::now(),
        };
        Ok(PendingSubmission {
            ticket: self.submit_requests.issue(),
            report,
        })
    }

    /// Apply the submitter's answer. Success resets the wizard unless it was
    /// reset or re-targeted meanwhile; failure keeps every choice so the
    /// operator can retry.
    pub fn finish_submit(
        &mut self,
        pending: PendingSubmission,
        result: Result<ReportAck, ServiceError>,
    ) -> Result<SubmitOutcome, SubmitError> {
        let ack = result?;
        let current = self.submit_requests.is_current(pending.ticket);
        info!(
            report_id = %ack.id,
            client_ref = %pending.report.client_ref,
            current,
            "failure report acknowledged"
        );
        if current {
            self.dispatch(WizardEvent::Reset);
        }
        Ok(SubmitOutcome {
            ack,
            wizard_reset: current,
        })
    }

    pub async fn submit(
        &mut self,
        submitter: &dyn Submitter,
        equipment_id: &str,
        draft: ReportDraft,
    ) -> Result<SubmitOutcome, SubmitError> {
        let pending = self.begin_submit(equipment_id, draft)?;
        let result = submitter.submit_report(pending.report()).await;
        self.finish_submit(pending, result)
    }

    /// Operator left the wizard. Loaded subsystems stay valid for the same
    /// equipment; everything else starts over.
    pub fn abandon(&mut self) {
        self.subsystem_requests.invalidate();
        self.dispatch(WizardEvent::Reset);
    }

    /// The selected equipment changed: the taxonomy no longer applies.
    pub fn on_equipment_changed(&mut self) {
        self.abandon();
        self.subsystems.clear();
    }
}
