#![forbid(unsafe_code)]

use crate::domain::AlarmStatus;
use parking_lot::Mutex;
use std::{collections::VecDeque, mem, sync::Arc};
use tracing::{debug, info, warn};

/// Observer of service state.
///
/// Notifications arrive in the order their changes were committed, after
/// they have been persisted and without the service lock held, so a
/// listener may call back into the service. Notifications caused by such a
/// call are delivered once the current one has reached every listener.
/// An operation that commits while another caller is delivering leaves its
/// notifications to that caller and may return before they arrive.
/// A listener that panics does not undo the committed change; the panic
/// reaches the caller and listeners after it miss that notification.
pub trait StatusListener: Send + Sync {
    fn alarm_status_changed(&self, status: AlarmStatus);
    fn cat_detected(&self, detected: bool);
    /// A sensor was added, removed, or had its flag changed.
    fn sensors_changed(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notification {
    AlarmStatus(AlarmStatus),
    CatDetected(bool),
    SensorsChanged,
}

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Arc<dyn StatusListener>)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Arc<dyn StatusListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Registered listeners in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn StatusListener>> {
        self.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
    }
}

#[derive(Default)]
struct Queue {
    pending: VecDeque<Notification>,
    delivering: bool,
}

/// Commit-ordered notification queue. The service posts while it still
/// holds its state lock, then calls `deliver` after releasing it. Only one
/// caller delivers at a time; a caller that finds delivery in progress
/// leaves its notifications to that caller.
#[derive(Default)]
pub(crate) struct Outbox {
    queue: Mutex<Queue>,
}

/// Resets the queue if a listener unwinds out of `Outbox::deliver`.
struct ResetOnUnwind<'a>(&'a Mutex<Queue>);

impl Drop for ResetOnUnwind<'_> {
    fn drop(&mut self) {
        let mut queue = self.0.lock();
        queue.delivering = false;
        if !queue.pending.is_empty() {
            warn!(
                dropped = queue.pending.len(),
                "listener panicked, dropping queued notifications"
            );
            queue.pending.clear();
        }
    }
}

impl Outbox {
    pub(crate) fn post(&self, notifications: &[Notification]) {
        self.queue.lock().pending.extend(notifications.iter().copied());
    }

    pub(crate) fn deliver(&self, listeners: &Mutex<Listeners>) {
        {
            let mut queue = self.queue.lock();
            if queue.delivering || queue.pending.is_empty() {
                return;
            }
            queue.delivering = true;
        }

        let reset = ResetOnUnwind(&self.queue);
        loop {
            let next = {
                let mut queue = self.queue.lock();
                match queue.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        queue.delivering = false;
                        break;
                    }
                }
            };
            let snapshot = listeners.lock().snapshot();
            debug!(notification = ?next, listeners = snapshot.len(), "notifying listeners");
            dispatch(&snapshot, &[next]);
        }
        mem::forget(reset);
    }
}

pub(crate) fn dispatch(listeners: &[Arc<dyn StatusListener>], notifications: &[Notification]) {
    for notification in notifications {
        for listener in listeners {
            match *notification {
                Notification::AlarmStatus(status) => listener.alarm_status_changed(status),
                Notification::CatDetected(detected) => listener.cat_detected(detected),
                Notification::SensorsChanged => listener.sensors_changed(),
            }
        }
    }
}

/// Listener that reports every notification through `tracing`.
#[derive(Debug, Default)]
pub struct LoggingListener;

impl StatusListener for LoggingListener {
    fn alarm_status_changed(&self, status: AlarmStatus) {
        info!(%status, "alarm status changed");
    }

    fn cat_detected(&self, detected: bool) {
        info!(detected, "camera checked for cat");
    }

    fn sensors_changed(&self) {
        info!("sensors changed");
    }
}
