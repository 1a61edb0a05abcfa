use crate::store::Store;
use gitdock_core::domain::StatusMatrix;
use gitdock_core::services::{PluginHost, Result};
use std::sync::Arc;
use std::thread;

/// Publishes the modified/untracked markers derived from a status matrix.
/// Existing decorations are always cleared first: diffing old against new is
/// not required, but applying without clearing could leave markers on paths
/// that are no longer modified or untracked.
pub fn reconcile(host: &dyn PluginHost, matrix: &StatusMatrix) -> Result<()> {
    host.clear_file_decorators()?;
    host.set_modified_decorator(&matrix.modified())?;
    host.set_untracked_decorator(&matrix.untracked())?;
    Ok(())
}

/// Store subscriber that republishes decorations whenever a new status
/// matrix lands. Lives as long as the store keeps notifying; the worker
/// winds down when the last store handle goes away.
pub struct DecorationReconciler {
    _join: thread::JoinHandle<()>,
}

impl DecorationReconciler {
    pub fn spawn(store: &Store, host: Arc<dyn PluginHost>) -> Self {
        let events = store.subscribe();
        let store = store.clone();

        let join = thread::spawn(move || {
            let mut last_seq: Option<u64> = None;
            while events.recv().is_ok() {
                let snapshot = store.snapshot();
                let status = &snapshot.file_status;
                if last_seq == Some(status.seq) {
                    continue;
                }
                last_seq = Some(status.seq);
                if let Err(err) = reconcile(host.as_ref(), &status.matrix) {
                    log::error!("decoration update failed: {err}");
                }
            }
        });

        Self { _join: join }
    }
}
