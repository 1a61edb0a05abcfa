use std::sync::{Arc, Mutex, mpsc};
use std::thread;

type Task = Box<dyn FnOnce() + Send + 'static>;

pub(super) fn default_worker_threads() -> usize {
    thread::available_parallelism()
        .map(|n| n.get().clamp(1, 4))
        .unwrap_or(2)
}

/// Small worker pool the orchestrator runs provider calls on. Tasks are
/// plain closures; each composite operation is one task, so its internal
/// steps stay strictly sequential while unrelated operations overlap.
pub(super) struct TaskExecutor {
    tx: mpsc::Sender<Task>,
    _workers: Vec<thread::JoinHandle<()>>,
}

impl TaskExecutor {
    pub(super) fn new(threads: usize) -> Self {
        let (tx, rx) = mpsc::channel::<Task>();
        let rx = Arc::new(Mutex::new(rx));

        let mut workers = Vec::with_capacity(threads);
        for _ in 0..threads {
            let rx = Arc::clone(&rx);
            workers.push(thread::spawn(move || {
                loop {
                    let task = {
                        let rx = rx.lock().expect("executor lock poisoned");
                        rx.recv()
                    };
                    match task {
                        Ok(task) => task(),
                        Err(_) => break,
                    }
                }
            }));
        }

        Self {
            tx,
            _workers: workers,
        }
    }

    pub(super) fn spawn(&self, task: impl FnOnce() + Send + 'static) {
        let _ = self.tx.send(Box::new(task));
    }
}
