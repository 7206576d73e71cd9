use crate::output::synthesize_outputs;
use crate::scenario::EventConfig;
use crate::select::select_next;
use crate::store::TaskStore;
use crate::task::{LoadedEvent, LogEntry, Queue, Task, TaskId};
use crate::timing::{Clock, Speed};

/// How many trailing log entries feed the timeline strip. A derived view,
/// not separate storage.
pub const RECENT_LOG_LIMIT: usize = 20;

/// An executed task waiting out its settle delay before retirement.
#[derive(Debug, Clone, Copy)]
struct SettlingTask {
    id: TaskId,
    retire_at: u64,
}

/// One simulation session: the task store plus every piece of execution
/// state, with the public operations the surrounding application drives.
///
/// The session is single-threaded and cooperative. The embedder calls
/// [`EventLoop::tick`] on a repeating cadence; each tick runs the promotion
/// sweep, retires a settled task, and — in automatic mode only — performs at
/// most one scheduling step. All counters live here as explicit fields,
/// never as ambient statics.
pub struct EventLoop<C: Clock> {
    clock: C,
    store: TaskStore,
    logs: Vec<LogEntry>,
    is_running: bool,
    is_automatic: bool,
    speed: Speed,
    step_counter: u64,
    has_started: bool,
    has_finished: bool,
    registration_counter: u64,
    log_counter: u64,
    next_step_at: Option<u64>,
    settling: Option<SettlingTask>,
}

impl<C: Clock> EventLoop<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            store: TaskStore::new(),
            logs: Vec::new(),
            is_running: false,
            is_automatic: true,
            speed: Speed::default(),
            step_counter: 0,
            has_started: false,
            has_finished: false,
            registration_counter: 0,
            log_counter: 0,
            next_step_at: None,
            settling: None,
        }
    }

    /// Enqueues the 1-2 sub-tasks for one load request. Never fails.
    pub fn load_event(&mut self, config: EventConfig) {
        let now = self.clock.now_ms();
        let name = config.name.clone();
        self.store.load_event(&config, now);
        self.log(format!("Event loaded: {name}"), Queue::CallStack, now);
    }

    /// Begins the run: automatic mode arms the step cadence, manual mode
    /// performs the first step immediately. A no-op while already running or
    /// with nothing queued.
    pub fn start(&mut self) {
        if self.is_running || !self.has_tasks_in_queue() {
            return;
        }
        let now = self.clock.now_ms();
        self.is_running = true;
        self.has_started = true;
        self.has_finished = false;
        self.log("--- Execution started ---", Queue::CallStack, now);
        if self.is_automatic {
            self.next_step_at = Some(now + self.speed.step_interval_ms());
        } else {
            self.execute_next(now);
        }
    }

    /// Full state wipe back to the initial session. Clears both scheduled
    /// deadlines, so no previously scheduled action can fire afterwards.
    /// Idempotent; mode and speed survive.
    pub fn reset(&mut self) {
        self.store.clear();
        self.logs.clear();
        self.is_running = false;
        self.has_started = false;
        self.has_finished = false;
        self.step_counter = 0;
        self.registration_counter = 0;
        self.log_counter = 0;
        self.next_step_at = None;
        self.settling = None;
    }

    /// One manual scheduling step. A no-op in automatic mode or with
    /// nothing queued.
    pub fn next_step(&mut self) {
        if self.is_automatic || !self.has_tasks_in_queue() {
            return;
        }
        let now = self.clock.now_ms();
        self.execute_next(now);
    }

    /// Hands stepping to the driver (automatic) or to explicit
    /// [`EventLoop::next_step`] calls (manual).
    pub fn set_automatic(&mut self, automatic: bool) {
        self.is_automatic = automatic;
        if !automatic {
            self.next_step_at = None;
        } else if self.is_running && self.next_step_at.is_none() {
            self.next_step_at = Some(self.clock.now_ms() + self.speed.step_interval_ms());
        }
    }

    /// Changes the step interval and settle delay for subsequent ticks; an
    /// already-armed deadline is left as scheduled.
    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
    }

    /// One cooperative tick, in fixed order: promotion sweep (both modes),
    /// then retirement of a settled task, then — automatic mode only — at
    /// most one scheduling step once its deadline has passed.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();

        let promotions =
            self.store
                .sweep(now, self.speed.step_interval_ms(), &mut self.registration_counter);
        for promotion in promotions {
            if promotion.to == Queue::Microtask {
                self.log(
                    format!("{} moved to microtask queue", promotion.display_name),
                    Queue::Microtask,
                    now,
                );
            }
        }

        if let Some(settling) = self.settling {
            if now >= settling.retire_at {
                self.settling = None;
                self.retire(settling.id, now);
            }
        }

        if self.is_running && self.is_automatic {
            if let Some(due_at) = self.next_step_at {
                if now >= due_at {
                    self.execute_next(now);
                    if self.is_running {
                        self.next_step_at = Some(now + self.speed.step_interval_ms());
                    } else {
                        self.next_step_at = None;
                    }
                }
            }
        }
    }

    /// Selects and executes the highest-priority runnable task, or detects
    /// the terminal state when only pending-async work remains.
    fn execute_next(&mut self, now: u64) {
        // At most one execution is in flight: a still-settling task from a
        // faster-than-settle manual step is retired first.
        if let Some(settling) = self.settling.take() {
            self.retire(settling.id, now);
        }

        let Some(id) = select_next(&self.store) else {
            self.is_running = false;
            self.has_finished = true;
            self.next_step_at = None;
            tracing::debug!("no runnable task, run finished");
            return;
        };
        let Some((display_name, queue)) = self
            .store
            .get(id)
            .map(|task| (task.display_name.clone(), task.queue))
        else {
            return;
        };

        self.store.begin_execution(id);
        tracing::debug!(%display_name, ?queue, "executing task");
        self.log(format!("Executing: {display_name}"), queue, now);
        self.settling = Some(SettlingTask {
            id,
            retire_at: now + self.speed.settle_delay_ms(),
        });
    }

    /// Retires an executed task after its settle delay: removes it from the
    /// displayed list, emits its synthesized outputs and advances the step
    /// counter.
    fn retire(&mut self, id: TaskId, now: u64) {
        let Some(task) = self.store.retire(id) else {
            return;
        };
        for text in synthesize_outputs(&task) {
            self.log(format!("OUTPUT: {text}"), task.queue, now);
        }
        self.step_counter += 1;
    }

    fn log(&mut self, message: impl Into<String>, queue: Queue, now: u64) {
        let id = self.log_counter;
        self.log_counter += 1;
        self.logs.push(LogEntry {
            id,
            message: message.into(),
            queue,
            timestamp: now,
        });
    }

    // --- observable state surface ---

    pub fn displayed_tasks(&self) -> impl Iterator<Item = &Task> {
        self.store.displayed_tasks()
    }

    pub fn pending_tasks(&self) -> impl Iterator<Item = &Task> {
        self.store.pending_tasks()
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// The trailing window feeding the timeline visualization.
    pub fn recent_logs(&self) -> &[LogEntry] {
        let start = self.logs.len().saturating_sub(RECENT_LOG_LIMIT);
        &self.logs[start..]
    }

    pub fn loaded_events(&self) -> &[LoadedEvent] {
        self.store.loaded_events()
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_automatic(&self) -> bool {
        self.is_automatic
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    pub fn has_finished(&self) -> bool {
        self.has_finished
    }

    pub fn step_counter(&self) -> u64 {
        self.step_counter
    }

    /// Whether `start`/`next_step` have anything to act on.
    pub fn has_tasks_in_queue(&self) -> bool {
        self.store.has_tasks()
    }
}
