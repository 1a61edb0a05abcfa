use gitdock_core::domain::*;
use gitdock_core::error::Error;

/// Reducer input. Events carry the successful results of side effects; the
/// orchestrator never dispatches a failed step, so no variant wraps an
/// error.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// One-way host readiness signal; there is no disconnected counterpart.
    PluginConnected,

    BranchesLoaded {
        branches: Vec<Branch>,
        current: Option<Branch>,
    },
    HeadResolved {
        head: Option<CommitId>,
    },
    RemotesLoaded {
        remotes: Vec<Remote>,
    },
    DefaultRemoteChanged {
        remote: Option<Remote>,
    },
    UpstreamChanged {
        remote: Option<Remote>,
    },

    CommitsLoaded {
        commits: Vec<Commit>,
    },
    /// Both directions always arrive together so the panels never show
    /// "ahead" with an unknown "behind".
    RemoteCommitsLoaded {
        ahead: Vec<Commit>,
        behind: Vec<Commit>,
    },

    /// A refresh was issued with this sequence number; later results tagged
    /// with an older number are stale and must be ignored.
    RefreshIssued {
        seq: u64,
    },
    FileStatusLoaded {
        seq: u64,
        matrix: StatusMatrix,
    },

    RepositoryInitialized {
        branch: Option<Branch>,
        head: Option<CommitId>,
    },

    CredentialsUpdated {
        user: GitHubUser,
        token: String,
        scopes: Vec<String>,
        emails: Vec<UserEmail>,
    },
    CredentialsCleared,
}

/// Callbacks arriving from the plugin host as raw tagged messages. Decoded
/// here so an unrecognized tag fails loudly before any state is touched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HostMessage {
    PluginConnected,
    FilesChanged,
    SettingsChanged,
}

impl HostMessage {
    pub fn decode(tag: &str) -> Result<Self, Error> {
        match tag {
            "plugin-connected" => Ok(Self::PluginConnected),
            "files-changed" => Ok(Self::FilesChanged),
            "settings-changed" => Ok(Self::SettingsChanged),
            other => Err(Error::UnknownEvent(other.to_string())),
        }
    }
}
