use gitdock_core::services::{PluginHost, Result, StatusKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::{fs, io};

/// Host with durable settings: the settings surface is backed by a JSON file
/// written atomically, everything UI-facing degrades to logging. Suitable
/// for headless embeddings that still need credentials to survive restarts.
pub struct FileHost {
    settings_path: PathBuf,
    // Serializes read-modify-write cycles on the settings file.
    write_lock: Mutex<()>,
}

impl FileHost {
    pub fn new(settings_path: PathBuf) -> Self {
        Self {
            settings_path,
            write_lock: Mutex::new(()),
        }
    }

    fn load_map(&self) -> BTreeMap<String, String> {
        let Ok(contents) = fs::read_to_string(&self.settings_path) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&contents).unwrap_or_default()
    }

    fn persist_map(&self, map: &BTreeMap<String, String>) -> io::Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.settings_path.with_extension("json.tmp");
        let contents =
            serde_json::to_vec_pretty(map).expect("serializing settings map should succeed");
        fs::write(&tmp_path, contents)?;

        match fs::rename(&tmp_path, &self.settings_path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                // Windows can't overwrite an existing file via rename.
                let copy_res = fs::copy(&tmp_path, &self.settings_path);
                let _ = fs::remove_file(&tmp_path);
                match copy_res {
                    Ok(_) => Ok(()),
                    Err(copy_err) => Err(io::Error::new(
                        copy_err.kind(),
                        format!("rename failed: {rename_err}; copy failed: {copy_err}"),
                    )),
                }
            }
        }
    }
}

impl PluginHost for FileHost {
    fn clear_file_decorators(&self) -> Result<()> {
        Ok(())
    }

    fn set_modified_decorator(&self, _paths: &[&Path]) -> Result<()> {
        Ok(())
    }

    fn set_untracked_decorator(&self, _paths: &[&Path]) -> Result<()> {
        Ok(())
    }

    fn open_file(&self, path: &Path) -> Result<()> {
        log::info!("open file requested: {}", path.display());
        Ok(())
    }

    fn open_diff(&self, reference: &str, path: &Path) -> Result<()> {
        log::info!("open diff requested: {reference} {}", path.display());
        Ok(())
    }

    fn settings_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load_map().get(key).cloned())
    }

    fn settings_set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().expect("settings lock poisoned");
        let mut map = self.load_map();
        map.insert(key.to_string(), value.to_string());
        self.persist_map(&map)?;
        Ok(())
    }

    fn settings_remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().expect("settings lock poisoned");
        let mut map = self.load_map();
        map.remove(key);
        self.persist_map(&map)?;
        Ok(())
    }

    fn show_alert(&self, message: &str) {
        log::warn!("alert: {message}");
    }

    fn status_changed(&self, key: &str, kind: StatusKind, title: &str) {
        log::info!("status {key}: {kind:?} {title}");
    }
}
