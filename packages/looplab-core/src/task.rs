use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Generational id for a task record. A queue transition inserts a new
    /// record under a new id; ids are never reused within a session.
    pub struct TaskId;
}

/// The four kinds of schedulable work a user can compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskKind {
    Sync,
    Timer,
    Promise,
    NetworkRequest,
}

/// The queue currently owning a task. This is the task's state: a task
/// occupies exactly one queue at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Queue {
    CallStack,
    PendingAsync,
    Microtask,
    Callback,
}

impl Queue {
    /// Selection priority, lower wins. `PendingAsync` is never selectable;
    /// its tasks only become runnable through promotion.
    pub fn priority(self) -> u8 {
        match self {
            Queue::CallStack => 0,
            Queue::Microtask => 1,
            Queue::Callback => 2,
            Queue::PendingAsync => 3,
        }
    }

    pub fn is_runnable(self) -> bool {
        self != Queue::PendingAsync
    }
}

/// Lazily-stamped promotion deadline for a pending-async task. Stamped
/// exactly once, the first time the sweep observes the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    NotYetDue,
    DueAt(u64),
}

/// The unit of schedulable work.
#[derive(Debug, Clone)]
pub struct Task {
    pub kind: TaskKind,
    /// Human label, rewritten at each lifecycle phase: "(register)",
    /// "(waiting)", "(ready)", "(response)", ...
    pub display_name: String,
    pub queue: Queue,
    /// Logical creation timestamp (ms) of the current phase.
    pub enqueued_at: u64,
    /// Timer wait threshold. Only meaningful while `queue == PendingAsync`;
    /// `None` falls back to the current speed's step interval at sweep time.
    pub ready_delay_ms: Option<u64>,
    /// Free-form text the user attached. Scanned, never executed.
    pub source_text: Option<String>,
    /// FIFO tie-break for the callback queue, allocated at promotion.
    pub registration_sequence: Option<u64>,
    pub readiness: Readiness,
}

/// Immutable append-only log record. Cleared only by a full reset.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub id: u64,
    pub message: String,
    /// Originating queue, for color/icon classification by consumers.
    pub queue: Queue,
    pub timestamp: u64,
}

/// One record per external load request, kept for the post-run summary.
#[derive(Debug, Clone)]
pub struct LoadedEvent {
    pub kind: TaskKind,
    pub name: String,
}
