use crate::auth::{AuthOutcome, DeviceAuthFlow};
use crate::credentials::CredentialStore;
use crate::event::{Event, HostMessage};
use crate::store::Store;
use gitdock_core::domain::*;
use gitdock_core::error::Error;
use gitdock_core::services::{AuthProvider, GitProvider, PluginHost, Result, StatusKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

mod executor;

use executor::{TaskExecutor, default_worker_threads};

#[cfg(test)]
mod tests;

/// One asynchronous operation per user/system intent. Each operation
/// validates preconditions against the current snapshot, runs its provider
/// calls on the executor, and dispatches successful results as events.
/// Provider failures are surfaced through the host alert sink and leave the
/// last known-good snapshot untouched.
pub struct Orchestrator {
    store: Store,
    provider: Arc<dyn GitProvider>,
    host: Arc<dyn PluginHost>,
    auth: Arc<dyn AuthProvider>,
    credentials: CredentialStore,
    executor: TaskExecutor,
    refresh_seq: Arc<AtomicU64>,
}

impl Orchestrator {
    pub fn new(
        store: Store,
        provider: Arc<dyn GitProvider>,
        host: Arc<dyn PluginHost>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let credentials = CredentialStore::new(Arc::clone(&host));
        Self {
            store,
            provider,
            host,
            auth,
            credentials,
            executor: TaskExecutor::new(default_worker_threads()),
            refresh_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Raw callbacks from the plugin host, decoded by tag. An unknown tag is
    /// a programming error on the wire and is rejected before any state is
    /// touched.
    pub fn handle_host_message(&self, tag: &str) -> Result<()> {
        match HostMessage::decode(tag)? {
            HostMessage::PluginConnected => {
                self.store.dispatch(Event::PluginConnected);
                self.load_credentials();
                self.refresh();
            }
            HostMessage::FilesChanged => self.refresh(),
            HostMessage::SettingsChanged => self.load_credentials(),
        }
        Ok(())
    }

    // ----- repository lifecycle -----

    pub fn init(&self) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        self.spawn_op("init", "Initializing repository", move || {
            provider.init()?;
            // Gather the whole post-init picture before dispatching anything,
            // so a failure midway leaves the prior snapshot intact.
            let branch = provider.current_branch()?;
            let head = provider.resolve_ref("HEAD")?;
            store.dispatch(Event::RepositoryInitialized { branch, head });
            load_branches(provider.as_ref(), &store)
        });
    }

    pub fn clone_repo(&self, url: String, opts: CloneOpts) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        let seq = self.next_refresh_seq();
        self.spawn_op("clone", "Cloning repository", move || {
            provider.clone_repo(&url, &opts)?;
            let branch = provider.current_branch()?;
            let head = provider.resolve_ref("HEAD")?;
            store.dispatch(Event::RepositoryInitialized { branch, head });
            load_branches(provider.as_ref(), &store)?;
            load_remotes(provider.as_ref(), &store)?;
            run_refresh(provider.as_ref(), &store, seq)
        });
    }

    // ----- working tree -----

    pub fn commit(&self, message: String) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        let seq = self.next_refresh_seq();
        self.spawn_op("commit", "Committing", move || {
            let id = provider.commit(&message)?;
            store.dispatch(Event::HeadResolved { head: Some(id) });
            run_refresh(provider.as_ref(), &store, seq)
        });
    }

    pub fn add(&self, paths: Vec<PathBuf>) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        let seq = self.next_refresh_seq();
        self.spawn_quiet("add", move || {
            let refs: Vec<&Path> = paths.iter().map(|p| p.as_path()).collect();
            provider.add(&refs)?;
            run_refresh(provider.as_ref(), &store, seq)
        });
    }

    pub fn add_all(&self) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        let seq = self.next_refresh_seq();
        self.spawn_quiet("add-all", move || {
            provider.add_all()?;
            run_refresh(provider.as_ref(), &store, seq)
        });
    }

    pub fn remove(&self, paths: Vec<PathBuf>) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        let seq = self.next_refresh_seq();
        self.spawn_quiet("remove", move || {
            let refs: Vec<&Path> = paths.iter().map(|p| p.as_path()).collect();
            provider.remove(&refs)?;
            run_refresh(provider.as_ref(), &store, seq)
        });
    }

    pub fn checkout(&self, reference: String) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        let seq = self.next_refresh_seq();
        self.spawn_quiet("checkout", move || {
            provider.checkout(&reference)?;
            load_branches(provider.as_ref(), &store)?;
            let head = provider.resolve_ref("HEAD")?;
            store.dispatch(Event::HeadResolved { head });
            run_refresh(provider.as_ref(), &store, seq)
        });
    }

    pub fn checkout_file(&self, reference: String, path: PathBuf) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        let seq = self.next_refresh_seq();
        self.spawn_quiet("checkout-file", move || {
            provider.checkout_file(&reference, &path)?;
            run_refresh(provider.as_ref(), &store, seq)
        });
    }

    // ----- branches -----

    /// Rejects empty and whitespace-only names locally; the provider is
    /// never called for an invalid name and no event is dispatched.
    pub fn create_branch(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidBranchName);
        }

        let name = name.to_string();
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        self.spawn_quiet("create-branch", move || {
            provider.create_branch(&name)?;
            load_branches(provider.as_ref(), &store)
        });
        Ok(())
    }

    pub fn checkout_branch(&self, name: String) {
        self.checkout(name);
    }

    // ----- remotes -----

    /// Remote selection precedence shared by every sync-family operation:
    /// explicitly-passed remote, then the upstream, then the default remote.
    pub fn active_remote(&self) -> Option<Remote> {
        self.resolve_remote(None).ok()
    }

    pub fn add_remote(&self, remote: Remote) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        self.spawn_quiet("add-remote", move || {
            provider.add_remote(&remote)?;
            load_remotes(provider.as_ref(), &store)
        });
    }

    pub fn remove_remote(&self, name: String) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        self.spawn_quiet("remove-remote", move || {
            provider.remove_remote(&name)?;
            load_remotes(provider.as_ref(), &store)?;

            // Drop dangling references to the removed remote.
            let snapshot = store.snapshot();
            if snapshot.default_remote.as_ref().is_some_and(|r| r.name == name) {
                store.dispatch(Event::DefaultRemoteChanged { remote: None });
            }
            if snapshot.upstream.as_ref().is_some_and(|r| r.name == name) {
                store.dispatch(Event::UpstreamChanged { remote: None });
            }
            Ok(())
        });
    }

    pub fn set_default_remote(&self, remote: Remote) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        self.spawn_quiet("set-default-remote", move || {
            provider.set_default_remote(&remote)?;
            store.dispatch(Event::DefaultRemoteChanged {
                remote: Some(remote),
            });
            Ok(())
        });
    }

    pub fn set_upstream_remote(&self, branch: String, remote: Remote) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        self.spawn_quiet("set-upstream", move || {
            provider.set_upstream_remote(&branch, &remote)?;
            store.dispatch(Event::UpstreamChanged {
                remote: Some(remote),
            });
            Ok(())
        });
    }

    // ----- synchronization -----

    pub fn fetch(&self, remote: Option<Remote>) -> Result<()> {
        let remote = self.resolve_remote(remote)?;
        let reference = self.checkout_ref()?;
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        self.spawn_op("fetch", "Fetching", move || {
            run_fetch(provider.as_ref(), &store, &remote, &reference)
        });
        Ok(())
    }

    pub fn pull(&self, remote: Option<Remote>) -> Result<()> {
        let remote = self.resolve_remote(remote)?;
        let reference = self.checkout_ref()?;
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        let seq = self.next_refresh_seq();
        self.spawn_op("pull", "Pulling", move || {
            run_pull(provider.as_ref(), &store, &remote, &reference)?;
            run_refresh(provider.as_ref(), &store, seq)
        });
        Ok(())
    }

    pub fn push(&self, remote: Option<Remote>) -> Result<()> {
        let remote = self.resolve_remote(remote)?;
        let reference = self.checkout_ref()?;
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        self.spawn_op("push", "Pushing", move || {
            run_push(provider.as_ref(), &store, &remote, &reference)
        });
        Ok(())
    }

    /// Pull strictly before push; a failed pull aborts the whole operation
    /// so a diverged remote is never masked by a push attempt.
    pub fn sync(&self, remote: Option<Remote>) -> Result<()> {
        let remote = self.resolve_remote(remote)?;
        let reference = self.checkout_ref()?;
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        let seq = self.next_refresh_seq();
        self.spawn_op("sync", "Syncing", move || {
            run_sync(provider.as_ref(), &store, &remote, &reference)?;
            run_refresh(provider.as_ref(), &store, seq)
        });
        Ok(())
    }

    // ----- log & status -----

    pub fn load_log(&self) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        self.spawn_quiet("log", move || {
            let commits = provider.log()?;
            store.dispatch(Event::CommitsLoaded { commits });
            Ok(())
        });
    }

    /// Points the active log view at a specific branch instead of the
    /// checkout.
    pub fn load_branch_commits(&self, branch: String, limit: usize) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        self.spawn_quiet("branch-commits", move || {
            let commits = provider.branch_commits(&branch, limit)?;
            store.dispatch(Event::CommitsLoaded { commits });
            Ok(())
        });
    }

    /// Status matrix and log reload. Each invocation gets a fresh sequence
    /// number so results from a superseded refresh are discarded by the
    /// reducer instead of overwriting newer state.
    pub fn refresh(&self) {
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        let seq = self.next_refresh_seq();
        self.spawn_quiet("refresh", move || {
            run_refresh(provider.as_ref(), &store, seq)
        });
    }

    pub fn load_remote_commits(&self) -> Result<()> {
        let remote = self.resolve_remote(None)?;
        let reference = self.checkout_ref()?;
        let provider = Arc::clone(&self.provider);
        let store = self.store.clone();
        self.spawn_quiet("remote-commits", move || {
            load_divergence(provider.as_ref(), &store, &remote, &reference)
        });
        Ok(())
    }

    // ----- credentials & auth -----

    /// Absence of a stored record is a normal state (fresh install), not an
    /// error; scopes stay empty until a profile fetch validates the token.
    pub fn load_credentials(&self) {
        let credentials = self.credentials.clone();
        let store = self.store.clone();
        self.spawn_quiet("load-credentials", move || {
            if let Some(record) = credentials.load()? {
                store.dispatch(Event::CredentialsUpdated {
                    user: GitHubUser {
                        login: record.username,
                        name: None,
                    },
                    token: record.token,
                    scopes: Vec::new(),
                    emails: vec![UserEmail {
                        email: record.email,
                        primary: true,
                    }],
                });
            }
            Ok(())
        });
    }

    /// Re-validates the current token against the auth boundary and replaces
    /// the identity fields with the authoritative profile.
    pub fn validate_scopes(&self) {
        let auth = Arc::clone(&self.auth);
        let store = self.store.clone();
        self.spawn_quiet("validate-scopes", move || {
            let Some(token) = store.snapshot().github_token else {
                return Ok(());
            };
            let profile = auth.fetch_profile(&token)?;
            store.dispatch(Event::CredentialsUpdated {
                user: profile.user,
                token,
                scopes: profile.scopes,
                emails: profile.emails,
            });
            Ok(())
        });
    }

    pub fn save_credentials(&self, username: &str, email: &str, token: &str) -> Result<()> {
        self.credentials.save(username, email, token)?;
        self.store.dispatch(Event::CredentialsUpdated {
            user: GitHubUser {
                login: username.to_string(),
                name: None,
            },
            token: token.to_string(),
            scopes: Vec::new(),
            emails: vec![UserEmail {
                email: email.to_string(),
                primary: true,
            }],
        });
        Ok(())
    }

    pub fn remove_token(&self) -> Result<()> {
        self.credentials.remove()?;
        self.store.dispatch(Event::CredentialsCleared);
        Ok(())
    }

    /// Starts the OAuth device-code flow. The returned handle owns the
    /// polling worker; dropping it stops the flow. On authorization the
    /// profile is persisted and dispatched like a manual credential save.
    pub fn start_device_auth(&self) -> Result<DeviceAuthFlow> {
        let credentials = self.credentials.clone();
        let store = self.store.clone();
        let host = Arc::clone(&self.host);

        DeviceAuthFlow::start(Arc::clone(&self.auth), move |outcome| match outcome {
            AuthOutcome::Authorized { token, profile } => {
                let email = profile
                    .emails
                    .iter()
                    .find(|e| e.primary)
                    .or(profile.emails.first())
                    .map(|e| e.email.clone())
                    .unwrap_or_default();
                if let Err(err) = credentials.save(&profile.user.login, &email, &token) {
                    log::error!("persisting device-flow credentials failed: {err}");
                }
                store.dispatch(Event::CredentialsUpdated {
                    user: profile.user,
                    token,
                    scopes: profile.scopes,
                    emails: profile.emails,
                });
            }
            AuthOutcome::Denied => host.show_alert("GitHub authorization was denied"),
            AuthOutcome::Expired => host.show_alert("GitHub authorization code expired"),
            AuthOutcome::Failed(err) => host.show_alert(&err.to_string()),
        })
    }

    // ----- host passthroughs -----

    pub fn open_file(&self, path: &Path) -> Result<()> {
        self.host.open_file(path)
    }

    pub fn open_diff(&self, reference: &str, path: &Path) -> Result<()> {
        self.host.open_diff(reference, path)
    }

    // ----- internals -----

    fn resolve_remote(&self, explicit: Option<Remote>) -> Result<Remote> {
        let snapshot = self.store.snapshot();
        explicit
            .or(snapshot.upstream)
            .or(snapshot.default_remote)
            .ok_or(Error::NoRemoteConfigured)
    }

    fn checkout_ref(&self) -> Result<String> {
        match self.store.snapshot().current_branch {
            Some(branch) if !branch.name.trim().is_empty() => Ok(branch.name),
            _ => Err(Error::InvalidBranchName),
        }
    }

    fn next_refresh_seq(&self) -> u64 {
        let seq = self.refresh_seq.fetch_add(1, Ordering::Relaxed) + 1;
        self.store.dispatch(Event::RefreshIssued { seq });
        seq
    }

    /// Long-running operation with coarse progress reported to the host
    /// shell: loading on entry, info or error on completion.
    fn spawn_op(
        &self,
        key: &'static str,
        title: &'static str,
        task: impl FnOnce() -> Result<()> + Send + 'static,
    ) {
        let host = Arc::clone(&self.host);
        host.status_changed(key, StatusKind::Loading, title);
        self.executor.spawn(move || match task() {
            Ok(()) => host.status_changed(key, StatusKind::Info, title),
            Err(err) => {
                log::error!("{key}: {err}");
                host.show_alert(&err.to_string());
                host.status_changed(key, StatusKind::Error, title);
            }
        });
    }

    /// Background operation without progress reporting; failures still reach
    /// the alert sink and are never silently swallowed.
    fn spawn_quiet(&self, key: &'static str, task: impl FnOnce() -> Result<()> + Send + 'static) {
        let host = Arc::clone(&self.host);
        self.executor.spawn(move || {
            if let Err(err) = task() {
                log::error!("{key}: {err}");
                host.show_alert(&err.to_string());
            }
        });
    }
}

// Composite operation bodies. Free functions so the sequencing is testable
// without the executor: each runs on one worker task, which is what makes
// its internal ordering strict.

pub(crate) fn load_branches(provider: &dyn GitProvider, store: &Store) -> Result<()> {
    // The branch list covers local and remote-tracking branches; everything
    // is read before the single dispatch.
    let mut branches = provider.branches()?;
    branches.extend(provider.remote_branches()?);
    let current = provider.current_branch()?;
    store.dispatch(Event::BranchesLoaded { branches, current });
    Ok(())
}

pub(crate) fn load_remotes(provider: &dyn GitProvider, store: &Store) -> Result<()> {
    let remotes = provider.remotes()?;
    store.dispatch(Event::RemotesLoaded { remotes });
    Ok(())
}

pub(crate) fn load_divergence(
    provider: &dyn GitProvider,
    store: &Store,
    remote: &Remote,
    reference: &str,
) -> Result<()> {
    let remote_ref = format!("{}/{}", remote.name, reference);
    let differences = provider.branch_differences(reference, &remote_ref)?;
    store.dispatch(Event::RemoteCommitsLoaded {
        ahead: differences.ahead,
        behind: differences.behind,
    });
    Ok(())
}

pub(crate) fn run_fetch(
    provider: &dyn GitProvider,
    store: &Store,
    remote: &Remote,
    reference: &str,
) -> Result<()> {
    provider.fetch(remote, reference, &FetchOpts::default())?;
    load_divergence(provider, store, remote, reference)
}

pub(crate) fn run_pull(
    provider: &dyn GitProvider,
    store: &Store,
    remote: &Remote,
    reference: &str,
) -> Result<()> {
    provider.pull(remote, reference)?;
    // Read head and divergence before dispatching either, so a failure here
    // leaves the pre-pull snapshot untouched.
    let head = provider.resolve_ref("HEAD")?;
    let remote_ref = format!("{}/{}", remote.name, reference);
    let differences = provider.branch_differences(reference, &remote_ref)?;
    store.dispatch(Event::HeadResolved { head });
    store.dispatch(Event::RemoteCommitsLoaded {
        ahead: differences.ahead,
        behind: differences.behind,
    });
    Ok(())
}

/// Push, then a forced shallow fetch: after a push the local picture of the
/// remote tip is stale, and `depth=1, single_branch=true` is enough to make
/// the ahead/behind lists accurate without a full-depth fetch.
pub(crate) fn run_push(
    provider: &dyn GitProvider,
    store: &Store,
    remote: &Remote,
    reference: &str,
) -> Result<()> {
    provider.push(remote, reference)?;
    provider.fetch(remote, reference, &FetchOpts::shallow_single_branch())?;
    load_divergence(provider, store, remote, reference)
}

pub(crate) fn run_sync(
    provider: &dyn GitProvider,
    store: &Store,
    remote: &Remote,
    reference: &str,
) -> Result<()> {
    run_pull(provider, store, remote, reference)?;
    run_push(provider, store, remote, reference)
}

/// Status matrix and log are independent siblings: neither orders before
/// the other, both are attempted, and each successful result is dispatched
/// even when the other fails. The first failure is reported.
pub(crate) fn run_refresh(provider: &dyn GitProvider, store: &Store, seq: u64) -> Result<()> {
    let matrix = provider.file_status_matrix(None);
    let commits = provider.log();

    let mut first_error = None;

    match matrix {
        Ok(matrix) => store.dispatch(Event::FileStatusLoaded { seq, matrix }),
        Err(err) => first_error = Some(err),
    }
    match commits {
        Ok(commits) => store.dispatch(Event::CommitsLoaded { commits }),
        Err(err) => first_error = first_error.or(Some(err)),
    }

    match first_error {
        None => Ok(()),
        Some(err) => Err(err),
    }
}
