use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CommitId(pub String);

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Commit {
    pub id: CommitId,
    pub parent_ids: Vec<CommitId>,
    pub summary: String,
    pub author: String,
    pub time: SystemTime,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Branch {
    pub name: String,
    /// `None` for a local-only branch, the tracking remote otherwise.
    pub remote: Option<Remote>,
}

impl Branch {
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote: None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Remote {
    pub name: String,
    pub url: Option<String>,
}

impl Remote {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommitFileChange {
    pub path: PathBuf,
    pub kind: FileChangeKind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileChangeKind {
    Added,
    Modified,
    Deleted,
}

/// Divergence between a local branch and its upstream, as full commit lists
/// so the client can render both directions.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BranchDifferences {
    pub ahead: Vec<Commit>,
    pub behind: Vec<Commit>,
}

/// Presence of a path in the HEAD tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HeadStatus {
    Absent,
    Present,
}

/// Working-tree state of a path relative to HEAD.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkdirStatus {
    Absent,
    Unmodified,
    Modified,
}

/// Index state of a path relative to HEAD.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StageStatus {
    Absent,
    Unmodified,
    Modified,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusRow {
    pub path: PathBuf,
    pub head: HeadStatus,
    pub workdir: WorkdirStatus,
    pub stage: StageStatus,
}

/// Per-path head/workdir/stage table for the whole working tree. Always
/// produced and consumed as a unit; callers never patch individual rows.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StatusMatrix {
    pub rows: Vec<StatusRow>,
}

impl StatusMatrix {
    pub fn new(rows: Vec<StatusRow>) -> Self {
        Self { rows }
    }

    /// Tracked paths whose working-tree state differs from HEAD. A deleted
    /// tracked file still carries the modified marker.
    pub fn modified(&self) -> Vec<&Path> {
        self.rows
            .iter()
            .filter(|row| {
                row.head == HeadStatus::Present && row.workdir != WorkdirStatus::Unmodified
            })
            .map(|row| row.path.as_path())
            .collect()
    }

    /// Paths present in the working tree but absent from HEAD.
    pub fn untracked(&self) -> Vec<&Path> {
        self.rows
            .iter()
            .filter(|row| row.head == HeadStatus::Absent && row.workdir != WorkdirStatus::Absent)
            .map(|row| row.path.as_path())
            .collect()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FetchOpts {
    pub relative: bool,
    pub depth: Option<usize>,
    pub single_branch: bool,
}

impl FetchOpts {
    /// The shallow fetch issued after a successful push to resynchronize
    /// local knowledge of the remote tip.
    pub fn shallow_single_branch() -> Self {
        Self {
            relative: false,
            depth: Some(1),
            single_branch: true,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CloneOpts {
    pub depth: Option<usize>,
    pub single_branch: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GitHubUser {
    pub login: String,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct UserEmail {
    pub email: String,
    pub primary: bool,
}

/// Identity facts returned by the auth boundary once a device-flow token is
/// granted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GitHubProfile {
    pub user: GitHubUser,
    pub scopes: Vec<String>,
    pub emails: Vec<UserEmail>,
}

/// Parameters of a started OAuth device-code authorization.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeviceCodeGrant {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub interval_secs: u64,
    pub expires_in_secs: u64,
}
