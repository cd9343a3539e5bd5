pub mod session;
pub mod storage;

pub use session::{CounterUpdate, SKIP_SHORTCUT_FLAG, SessionCache, SessionFacts};
pub use storage::{JsonFileSessionStore, MemorySessionStore, SessionStore};
