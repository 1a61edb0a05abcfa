use gitdock_core::services::{PluginHost, Result, StatusKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One recorded decoration or viewer call, in arrival order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HostCall {
    ClearDecorators,
    SetModified(Vec<PathBuf>),
    SetUntracked(Vec<PathBuf>),
    OpenFile(PathBuf),
    OpenDiff { reference: String, path: PathBuf },
}

/// In-memory host: settings live in a map, every UI-facing call is recorded.
/// Backs tests and headless embeddings.
#[derive(Default)]
pub struct MemoryHost {
    settings: Mutex<BTreeMap<String, String>>,
    calls: Mutex<Vec<HostCall>>,
    alerts: Mutex<Vec<String>>,
    statuses: Mutex<Vec<(String, StatusKind, String)>>,
}

impl MemoryHost {
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().expect("alert log poisoned").clone()
    }

    pub fn statuses(&self) -> Vec<(String, StatusKind, String)> {
        self.statuses.lock().expect("status log poisoned").clone()
    }

    pub fn setting(&self, key: &str) -> Option<String> {
        self.settings
            .lock()
            .expect("settings poisoned")
            .get(key)
            .cloned()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().expect("call log poisoned").push(call);
    }
}

impl PluginHost for MemoryHost {
    fn clear_file_decorators(&self) -> Result<()> {
        self.record(HostCall::ClearDecorators);
        Ok(())
    }

    fn set_modified_decorator(&self, paths: &[&Path]) -> Result<()> {
        self.record(HostCall::SetModified(
            paths.iter().map(|p| p.to_path_buf()).collect(),
        ));
        Ok(())
    }

    fn set_untracked_decorator(&self, paths: &[&Path]) -> Result<()> {
        self.record(HostCall::SetUntracked(
            paths.iter().map(|p| p.to_path_buf()).collect(),
        ));
        Ok(())
    }

    fn open_file(&self, path: &Path) -> Result<()> {
        self.record(HostCall::OpenFile(path.to_path_buf()));
        Ok(())
    }

    fn open_diff(&self, reference: &str, path: &Path) -> Result<()> {
        self.record(HostCall::OpenDiff {
            reference: reference.to_string(),
            path: path.to_path_buf(),
        });
        Ok(())
    }

    fn settings_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.setting(key))
    }

    fn settings_set(&self, key: &str, value: &str) -> Result<()> {
        self.settings
            .lock()
            .expect("settings poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn settings_remove(&self, key: &str) -> Result<()> {
        self.settings.lock().expect("settings poisoned").remove(key);
        Ok(())
    }

    fn show_alert(&self, message: &str) {
        self.alerts
            .lock()
            .expect("alert log poisoned")
            .push(message.to_string());
    }

    fn status_changed(&self, key: &str, kind: StatusKind, title: &str) {
        self.statuses.lock().expect("status log poisoned").push((
            key.to_string(),
            kind,
            title.to_string(),
        ));
    }
}
