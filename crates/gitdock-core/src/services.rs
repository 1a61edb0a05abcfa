use crate::domain::*;
use crate::error::Error;
use std::path::Path;

pub type Result<T> = std::result::Result<T, Error>;

/// The external version-control engine. Performs the actual object-store
/// reads/writes and network transport; this crate only coordinates calls.
///
/// Optional operations default to `Unsupported` so partial engines can still
/// drive the core panels.
pub trait GitProvider: Send + Sync {
    fn init(&self) -> Result<()>;
    fn clone_repo(&self, url: &str, opts: &CloneOpts) -> Result<()>;

    fn commit(&self, message: &str) -> Result<CommitId>;
    fn add(&self, paths: &[&Path]) -> Result<()>;
    fn add_all(&self) -> Result<()>;
    fn remove(&self, paths: &[&Path]) -> Result<()>;
    fn checkout(&self, reference: &str) -> Result<()>;
    fn checkout_file(&self, _reference: &str, _path: &Path) -> Result<()> {
        Err(Error::Unsupported(
            "single-file checkout is not implemented for this provider",
        ))
    }

    fn create_branch(&self, name: &str) -> Result<()>;
    fn branches(&self) -> Result<Vec<Branch>>;
    fn remote_branches(&self) -> Result<Vec<Branch>>;
    fn current_branch(&self) -> Result<Option<Branch>>;

    fn remotes(&self) -> Result<Vec<Remote>>;
    fn add_remote(&self, remote: &Remote) -> Result<()>;
    fn remove_remote(&self, name: &str) -> Result<()>;
    fn set_default_remote(&self, remote: &Remote) -> Result<()>;
    fn set_upstream_remote(&self, branch: &str, remote: &Remote) -> Result<()>;

    fn fetch(&self, remote: &Remote, reference: &str, opts: &FetchOpts) -> Result<()>;
    fn pull(&self, remote: &Remote, reference: &str) -> Result<()>;
    fn push(&self, remote: &Remote, reference: &str) -> Result<()>;

    /// Full head/workdir/stage table; `filter` narrows to the given paths,
    /// `None` covers the whole working tree.
    fn file_status_matrix(&self, filter: Option<&[&Path]>) -> Result<StatusMatrix>;

    fn diff(&self, _reference: &str, _path: &Path) -> Result<String> {
        Err(Error::Unsupported(
            "diff is not implemented for this provider",
        ))
    }

    fn resolve_ref(&self, reference: &str) -> Result<Option<CommitId>>;

    fn commit_changes(&self, _id: &CommitId) -> Result<Vec<CommitFileChange>> {
        Err(Error::Unsupported(
            "per-commit changes are not implemented for this provider",
        ))
    }

    fn branch_commits(&self, branch: &str, limit: usize) -> Result<Vec<Commit>>;

    /// Ahead/behind commit lists between a local branch and a remote ref.
    fn branch_differences(&self, local: &str, remote_ref: &str) -> Result<BranchDifferences>;

    /// Commit log for the active view, most-recent first.
    fn log(&self) -> Result<Vec<Commit>>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusKind {
    Loading,
    Info,
    Error,
}

/// The host plugin runtime: file decorations, file/diff viewers, persisted
/// settings, user-facing alerts, and coarse progress reporting.
pub trait PluginHost: Send + Sync {
    fn clear_file_decorators(&self) -> Result<()>;
    fn set_modified_decorator(&self, paths: &[&Path]) -> Result<()>;
    fn set_untracked_decorator(&self, paths: &[&Path]) -> Result<()>;

    fn open_file(&self, path: &Path) -> Result<()>;
    fn open_diff(&self, reference: &str, path: &Path) -> Result<()>;

    fn settings_get(&self, key: &str) -> Result<Option<String>>;
    fn settings_set(&self, key: &str, value: &str) -> Result<()>;
    fn settings_remove(&self, key: &str) -> Result<()>;

    fn show_alert(&self, message: &str);
    fn status_changed(&self, key: &str, kind: StatusKind, title: &str);
}

/// One poll of the device-code token endpoint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DevicePoll {
    AuthorizationPending,
    SlowDown,
    Authorized { token: String },
    Denied,
    Expired,
}

/// The OAuth device-code boundary. Only the state transitions it drives are
/// in scope; endpoints and wire formats belong to the implementor.
pub trait AuthProvider: Send + Sync {
    fn begin_device_flow(&self) -> Result<DeviceCodeGrant>;
    fn poll_device_token(&self, device_code: &str) -> Result<DevicePoll>;
    fn fetch_profile(&self, token: &str) -> Result<GitHubProfile>;
}
