use crate::event::Event;
use crate::model::RepositoryState;
use std::sync::{Arc, Mutex, RwLock, mpsc};
use std::thread;

mod reducer;

pub use reducer::reduce;

/// Notification fanned out to subscribers after every reduction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StoreEvent {
    StateChanged,
}

/// The single source of truth for repository state. Exactly one writer path
/// exists: the store thread, which applies the pure reducer to each
/// dispatched event in arrival order. Everyone else reads snapshots.
pub struct Store {
    state: Arc<RwLock<RepositoryState>>,
    event_tx: mpsc::Sender<Event>,
    subscribers: Arc<Mutex<Vec<mpsc::Sender<StoreEvent>>>>,
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            event_tx: self.event_tx.clone(),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl Store {
    pub fn new() -> Self {
        let state = Arc::new(RwLock::new(RepositoryState::default()));
        let subscribers: Arc<Mutex<Vec<mpsc::Sender<StoreEvent>>>> =
            Arc::new(Mutex::new(Vec::new()));
        let (event_tx, event_rx) = mpsc::channel::<Event>();

        let thread_state = Arc::clone(&state);
        let thread_subscribers = Arc::clone(&subscribers);

        thread::spawn(move || {
            while let Ok(event) = event_rx.recv() {
                log::debug!("reducing {event:?}");
                {
                    let mut state = thread_state.write().expect("state lock poisoned (write)");
                    let next = reduce(&state, &event);
                    *state = next;
                }

                let mut subscribers = thread_subscribers
                    .lock()
                    .expect("subscriber lock poisoned");
                subscribers.retain(|tx| tx.send(StoreEvent::StateChanged).is_ok());
            }
        });

        Self {
            state,
            event_tx,
            subscribers,
        }
    }

    pub fn dispatch(&self, event: Event) {
        let _ = self.event_tx.send(event);
    }

    pub fn snapshot(&self) -> RepositoryState {
        self.state
            .read()
            .expect("state lock poisoned (read)")
            .clone()
    }

    /// Register a listener for post-reduction notifications. Dropped
    /// receivers are pruned on the next dispatch.
    pub fn subscribe(&self) -> mpsc::Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .push(tx);
        rx
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
