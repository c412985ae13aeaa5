use std::{
    collections::{HashSet, VecDeque},
    fmt,
    hash::Hash,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::sync::Notify;

use djo_model::{RecordKey, RecordKind};

/// Identity of one record in the work queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    pub kind: RecordKind,
    pub key: RecordKey,
}

impl WorkItem {
    pub fn new(kind: RecordKind, key: RecordKey) -> Self {
        Self { kind, key }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.key)
    }
}

/// Deduplicating work queue with per-item serialization.
///
/// - an item waiting in the queue is stored once, however often it is added;
/// - an item handed out by [`WorkQueue::get`] is not handed out again until
///   [`WorkQueue::done`]; adds in between are deferred to that point.
///
/// Cheap to clone; clones share the queue.
pub struct WorkQueue<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    notify: Notify,
}

struct State<T> {
    queue: VecDeque<T>,
    dirty: HashSet<T>,
    processing: HashSet<T>,
    shutdown: bool,
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for WorkQueue<T>
where
    T: Hash + Eq + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T>
where
    T: Hash + Eq + Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    dirty: HashSet::new(),
                    processing: HashSet::new(),
                    shutdown: false,
                }),
                notify: Notify::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State<T>> {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enqueue `item` unless it is already waiting. Ignored after shutdown.
    pub fn add(&self, item: T) {
        let mut st = self.state();
        if st.shutdown || st.dirty.contains(&item) {
            return;
        }
        st.dirty.insert(item.clone());
        if st.processing.contains(&item) {
            return;
        }
        st.queue.push_back(item);
        drop(st);
        self.shared.notify.notify_one();
    }

    /// Enqueue `item` once `delay` has elapsed.
    pub fn add_after(&self, item: T, delay: Duration) {
        if delay.is_zero() {
            self.add(item);
            return;
        }
        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(item);
        });
    }

    /// Wait for the next item. `None` once the queue is shut down and drained.
    pub async fn get(&self) -> Option<T> {
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut st = self.state();
                if let Some(item) = st.queue.pop_front() {
                    st.dirty.remove(&item);
                    st.processing.insert(item.clone());
                    return Some(item);
                }
                if st.shutdown {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Mark `item` as processed; requeues it if it was added meanwhile.
    pub fn done(&self, item: &T) {
        let mut st = self.state();
        st.processing.remove(item);
        if st.dirty.contains(item) && !st.shutdown {
            st.queue.push_back(item.clone());
            drop(st);
            self.shared.notify.notify_one();
        }
    }

    /// Stop accepting items and wake every waiting consumer.
    pub fn shutdown(&self) {
        self.state().shutdown = true;
        self.shared.notify.notify_waiters();
    }

    pub fn is_shutdown(&self) -> bool {
        self.state().shutdown
    }

    /// Number of items waiting (not counting those being processed).
    pub fn len(&self) -> usize {
        self.state().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
