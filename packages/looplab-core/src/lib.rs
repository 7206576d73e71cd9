//! Looplab core: a single-threaded cooperative scheduler that reproduces the
//! browser/JS event-loop semantics — call stack, environment (pending-async)
//! APIs, microtask queue and callback queue — for step-by-step observation.
//!
//! The engine never executes user code. The "code" attached to a task is only
//! scanned for print-style literals to synthesize log output.

pub mod output;
pub mod scenario;
pub mod select;
pub mod session;
pub mod store;
pub mod task;
pub mod timing;

pub use output::{synthesize_outputs, RESPONSE_PLACEHOLDER};
pub use scenario::{EventConfig, Scenario, ScenarioError};
pub use select::select_next;
pub use session::{EventLoop, RECENT_LOG_LIMIT};
pub use store::{PromotionRecord, TaskStore};
pub use task::{LoadedEvent, LogEntry, Queue, Readiness, Task, TaskId, TaskKind};
pub use timing::{Clock, ManualClock, Speed, SystemClock, NETWORK_LATENCY_MS};
