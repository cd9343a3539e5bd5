/*
[INPUT]:  Public API exports for upkeep-client crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod board;
pub mod completion;
pub mod config;
pub mod error;
pub mod sequence;
pub mod services;
pub mod state;
pub mod urgency;
pub mod wizard;

// Re-export main types for convenience
pub use board::{TaskBoard, TaskView};
pub use completion::{CompletionOutcome, CompletionRequest, TaskCompletionCoordinator};
pub use config::Settings;
pub use error::{CompletionError, ServiceError, StoreError, SubmitError, ValidationError};
pub use sequence::{RequestSequence, RequestTicket};
pub use services::{Fetcher, Submitter};
pub use state::{JsonFileSessionStore, MemorySessionStore, SessionCache, SessionStore};
pub use urgency::{
    LastUpdated, Remaining, UrgencyCalculator, UrgencyPolicy, UrgencyResult, UrgencyTier,
    compute_urgency, last_updated_label,
};
pub use wizard::{
    ClassificationSelection, ClassificationWizard, ReportDraft, SubmitOutcome, WizardEvent,
    WizardStep,
};
