use gitdock_core::domain::*;

/// One immutable snapshot of everything the panels render. Owned exclusively
/// by the store; replaced wholesale on every reduction, never mutated in
/// place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RepositoryState {
    /// Whether the provider/runtime is available at all.
    pub can_use_app: bool,

    pub current_branch: Option<Branch>,
    /// `None` until the repository has at least one commit.
    pub current_head: Option<CommitId>,

    pub branches: Vec<Branch>,
    pub remotes: Vec<Remote>,
    pub default_remote: Option<Remote>,
    /// Tracking remote for the current branch.
    pub upstream: Option<Remote>,

    /// Active log view, most-recent first.
    pub commits: Vec<Commit>,
    /// Divergence against `upstream`; both empty means in sync. Only
    /// meaningful once `upstream` is set.
    pub commits_ahead: Vec<Commit>,
    pub commits_behind: Vec<Commit>,

    pub file_status: FileStatusResult,
    /// Highest refresh sequence number issued so far. Results tagged with an
    /// older number are discarded by the reducer.
    pub file_status_seq_issued: u64,

    pub github_user: Option<GitHubUser>,
    pub github_token: Option<String>,
    pub github_scopes: Vec<String>,
    pub user_emails: Vec<UserEmail>,

    pub loader: LoaderFlags,
}

/// The status matrix together with the refresh sequence number that produced
/// it. Replaced as a unit so readers never observe rows from two refreshes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FileStatusResult {
    pub seq: u64,
    pub matrix: StatusMatrix,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LoaderFlags {
    /// Set once by the host-connection event, never reset for the session.
    pub plugin: bool,
}

impl RepositoryState {
    /// An uninitialized repository has no head commit and no named branch.
    pub fn is_uninitialized(&self) -> bool {
        self.current_head.is_none()
            && self
                .current_branch
                .as_ref()
                .is_none_or(|b| b.name.trim().is_empty())
    }

    /// A GitHub user with an empty recorded scope list is surfaced as a
    /// non-fatal warning, never an error.
    pub fn scope_warning(&self) -> bool {
        !crate::credentials::has_valid_scopes(self.github_user.as_ref(), &self.github_scopes)
    }
}

/// Which panel set the UI should show for the current snapshot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SetupPhase {
    /// No commits and no named branch yet; exits only via init/clone.
    NeedsInit,
    /// Initialized but identity is incomplete; exits via credential save.
    NeedsSetup,
    Normal,
}

impl SetupPhase {
    /// `NeedsInit` is checked first: an uninitialized repository gets the
    /// init prompt even when identity is also missing, because
    /// initialization is the prerequisite action.
    pub fn classify(state: &RepositoryState) -> Self {
        if state.is_uninitialized() {
            return Self::NeedsInit;
        }

        let username_missing = state
            .github_user
            .as_ref()
            .is_none_or(|u| u.login.trim().is_empty());
        let email_missing = !state.user_emails.iter().any(|e| !e.email.trim().is_empty());
        if username_missing || email_missing {
            return Self::NeedsSetup;
        }

        Self::Normal
    }
}
