use crate::scenario::EventConfig;
use crate::task::{LoadedEvent, Queue, Readiness, Task, TaskId, TaskKind};
use crate::timing::{MICROTASK_SCHEDULE_OFFSET_MS, NETWORK_LATENCY_MS};

use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use smallvec::SmallVec;

/// Record of one promotion performed by the sweep, for the session's log.
#[derive(Debug, Clone)]
pub struct PromotionRecord {
    pub display_name: String,
    pub to: Queue,
}

/// Owns the canonical task records: the arena, the pending buffer (every
/// task not yet fully executed, in insertion order) and the displayed list
/// (the transient subset a view should show).
#[derive(Default)]
pub struct TaskStore {
    arena: SlotMap<TaskId, Task>,
    pending: Vec<TaskId>,
    displayed: Vec<TaskId>,
    loaded: Vec<LoadedEvent>,
    /// Pending-async ids already promoted once. Promotion removes the source
    /// record synchronously, but the guard keeps a repeated sweep from ever
    /// applying the transition twice.
    promoted: FxHashSet<TaskId>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates one external load request into its initial task topology.
    /// Total over the input domain: nothing here can fail.
    pub fn load_event(&mut self, config: &EventConfig, now: u64) {
        let mut tasks: SmallVec<[Task; 2]> = SmallVec::new();
        let mut display_immediately: Option<usize> = None;

        match config.kind {
            TaskKind::Sync => {
                tasks.push(self.phase_task(config, config.name.clone(), Queue::CallStack, now));
            }
            TaskKind::Timer => {
                tasks.push(self.phase_task(
                    config,
                    format!("{} (register)", config.name),
                    Queue::CallStack,
                    now,
                ));
                tasks.push(self.phase_task(
                    config,
                    format!("{} (waiting)", config.name),
                    Queue::PendingAsync,
                    now,
                ));
            }
            TaskKind::Promise => {
                tasks.push(self.phase_task(
                    config,
                    format!("{} (create)", config.name),
                    Queue::CallStack,
                    now,
                ));
                // The continuation is scheduled in the same tick, directly in
                // the microtask queue, just after its creation task.
                tasks.push(self.phase_task(
                    config,
                    format!("{} (then)", config.name),
                    Queue::Microtask,
                    now + MICROTASK_SCHEDULE_OFFSET_MS,
                ));
            }
            TaskKind::NetworkRequest => {
                tasks.push(self.phase_task(
                    config,
                    format!("{} (init)", config.name),
                    Queue::CallStack,
                    now,
                ));
                tasks.push(self.phase_task(
                    config,
                    format!("{} (pending)", config.name),
                    Queue::PendingAsync,
                    now,
                ));
                // The in-flight request is shown before the call stack
                // drains, unlike timers.
                display_immediately = Some(tasks.len() - 1);
            }
        }

        for (index, task) in tasks.into_iter().enumerate() {
            let id = self.arena.insert(task);
            self.pending.push(id);
            if display_immediately == Some(index) {
                self.displayed.push(id);
            }
        }

        self.loaded.push(LoadedEvent {
            kind: config.kind,
            name: config.name.clone(),
        });
        tracing::debug!(kind = ?config.kind, name = %config.name, "event loaded");
    }

    fn phase_task(&self, config: &EventConfig, display_name: String, queue: Queue, at: u64) -> Task {
        Task {
            kind: config.kind,
            display_name,
            queue,
            enqueued_at: at,
            ready_delay_ms: config.delay,
            source_text: config.code.clone(),
            registration_sequence: None,
            readiness: Readiness::NotYetDue,
        }
    }

    /// Per-tick promotion sweep over the pending-async set. Runs in both
    /// automatic and manual mode: it models passive environment progress,
    /// not user-driven stepping.
    ///
    /// Timers fall back to `default_timer_delay_ms` (the current step
    /// interval) when the load request carried no delay; network requests
    /// always wait the fixed [`NETWORK_LATENCY_MS`].
    pub fn sweep(
        &mut self,
        now: u64,
        default_timer_delay_ms: u64,
        registration_counter: &mut u64,
    ) -> Vec<PromotionRecord> {
        let mut promotions = Vec::new();

        let pending_async: Vec<TaskId> = self
            .pending
            .iter()
            .copied()
            .filter(|&id| {
                self.arena
                    .get(id)
                    .is_some_and(|t| t.queue == Queue::PendingAsync)
            })
            .collect();

        for id in pending_async {
            if self.promoted.contains(&id) {
                continue;
            }
            let Some(task) = self.arena.get_mut(id) else {
                continue;
            };
            let kind = task.kind;
            let wait_ms = match kind {
                TaskKind::Timer => task.ready_delay_ms.unwrap_or(default_timer_delay_ms),
                TaskKind::NetworkRequest => NETWORK_LATENCY_MS,
                // Sync and promise tasks never sit in the pending-async set.
                _ => continue,
            };
            let due_at = match task.readiness {
                Readiness::NotYetDue => {
                    let due_at = now + wait_ms;
                    task.readiness = Readiness::DueAt(due_at);
                    due_at
                }
                Readiness::DueAt(due_at) => due_at,
            };
            if now < due_at {
                continue;
            }

            match kind {
                TaskKind::Timer => promotions.push(self.promote_timer(id, now, registration_counter)),
                TaskKind::NetworkRequest => promotions.push(self.promote_network(id, now)),
                _ => {}
            }
        }

        promotions.into_iter().flatten().collect()
    }

    /// Elapsed timer: pending-async -> callback queue, stamped with the next
    /// registration sequence so callbacks run in registration order even
    /// when delays race.
    fn promote_timer(
        &mut self,
        id: TaskId,
        now: u64,
        registration_counter: &mut u64,
    ) -> Option<PromotionRecord> {
        self.pending.retain(|&x| x != id);
        self.displayed.retain(|&x| x != id);
        let old = self.arena.remove(id)?;

        let sequence = *registration_counter;
        *registration_counter += 1;

        let display_name = old.display_name.replace("(waiting)", "(ready)");
        let new_id = self.arena.insert(Task {
            kind: old.kind,
            display_name: display_name.clone(),
            queue: Queue::Callback,
            enqueued_at: now,
            ready_delay_ms: None,
            source_text: old.source_text,
            registration_sequence: Some(sequence),
            readiness: Readiness::NotYetDue,
        });
        self.pending.push(new_id);
        tracing::debug!(%display_name, sequence, "timer promoted to callback queue");

        Some(PromotionRecord {
            display_name,
            to: Queue::Callback,
        })
    }

    /// Completed network request: pending-async -> microtask queue. The
    /// displayed entry is swapped in place so observers never see the
    /// pending and response records together, nor neither.
    fn promote_network(&mut self, id: TaskId, now: u64) -> Option<PromotionRecord> {
        self.promoted.insert(id);
        self.pending.retain(|&x| x != id);
        let old = self.arena.remove(id)?;

        let display_name = old.display_name.replace("(pending)", "(response)");
        let new_id = self.arena.insert(Task {
            kind: old.kind,
            display_name: display_name.clone(),
            queue: Queue::Microtask,
            enqueued_at: now,
            ready_delay_ms: None,
            source_text: old.source_text,
            registration_sequence: None,
            readiness: Readiness::NotYetDue,
        });
        self.pending.push(new_id);
        if let Some(slot) = self.displayed.iter_mut().find(|slot| **slot == id) {
            *slot = new_id;
        } else {
            self.displayed.push(new_id);
        }
        tracing::debug!(%display_name, "network response promoted to microtask queue");

        Some(PromotionRecord {
            display_name,
            to: Queue::Microtask,
        })
    }

    /// Moves a selected task out of the pending buffer and surfaces it as
    /// active. Promoted network responses are already displayed; no
    /// duplicate entry is added.
    pub fn begin_execution(&mut self, id: TaskId) {
        self.pending.retain(|&x| x != id);
        if !self.displayed.contains(&id) {
            self.displayed.push(id);
        }
    }

    /// Removes a fully executed task from the displayed list and destroys
    /// its record, returning it for output synthesis.
    pub fn retire(&mut self, id: TaskId) -> Option<Task> {
        self.displayed.retain(|&x| x != id);
        self.arena.remove(id)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.arena.get(id)
    }

    pub fn pending_ids(&self) -> &[TaskId] {
        &self.pending
    }

    pub fn pending_tasks(&self) -> impl Iterator<Item = &Task> {
        self.pending.iter().filter_map(|&id| self.arena.get(id))
    }

    pub fn displayed_tasks(&self) -> impl Iterator<Item = &Task> {
        self.displayed.iter().filter_map(|&id| self.arena.get(id))
    }

    pub fn loaded_events(&self) -> &[LoadedEvent] {
        &self.loaded
    }

    pub fn has_tasks(&self) -> bool {
        !self.pending.is_empty() || !self.displayed.is_empty()
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.pending.clear();
        self.displayed.clear();
        self.loaded.clear();
        self.promoted.clear();
    }
}
