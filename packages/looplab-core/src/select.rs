use crate::store::TaskStore;
use crate::task::{Queue, Task, TaskId};

/// Picks the next runnable task from the pending buffer, or `None` when only
/// pending-async tasks (or nothing) remain and the run is over.
///
/// Priority is call stack < microtask < callback, lower first. Ties within
/// the callback queue break by registration sequence, ties elsewhere by
/// enqueue timestamp; a residual tie keeps the earlier buffer entry, so the
/// order is total and deterministic.
pub fn select_next(store: &TaskStore) -> Option<TaskId> {
    let mut best: Option<(TaskId, &Task)> = None;
    for &id in store.pending_ids() {
        let Some(task) = store.get(id) else { continue };
        if !task.queue.is_runnable() {
            continue;
        }
        match best {
            Some((_, current)) if !ranks_before(task, current) => {}
            _ => best = Some((id, task)),
        }
    }
    best.map(|(id, _)| id)
}

fn ranks_before(a: &Task, b: &Task) -> bool {
    let (pa, pb) = (a.queue.priority(), b.queue.priority());
    if pa != pb {
        return pa < pb;
    }
    if a.queue == Queue::Callback {
        a.registration_sequence.unwrap_or(0) < b.registration_sequence.unwrap_or(0)
    } else {
        a.enqueued_at < b.enqueued_at
    }
}
