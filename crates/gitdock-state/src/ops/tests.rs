use super::*;
use gitdock_core::services::DevicePoll;
use gitdock_host::{MemoryHost, NoopAuth};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

struct ScriptedProvider {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    fn failing_on(self, op: &'static str) -> Self {
        self.failing.lock().unwrap().insert(op);
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn count_prefix(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn check(&self, op: &'static str) -> Result<()> {
        if self.failing.lock().unwrap().contains(op) {
            return Err(Error::provider(format!("{op} rejected")));
        }
        Ok(())
    }
}

fn commit_named(id: &str) -> Commit {
    Commit {
        id: CommitId(id.into()),
        parent_ids: Vec::new(),
        summary: format!("commit {id}"),
        author: "dev".into(),
        time: SystemTime::UNIX_EPOCH,
    }
}

impl GitProvider for ScriptedProvider {
    fn init(&self) -> Result<()> {
        self.record("init".into());
        self.check("init")
    }

    fn clone_repo(&self, url: &str, _opts: &CloneOpts) -> Result<()> {
        self.record(format!("clone {url}"));
        self.check("clone")
    }

    fn commit(&self, message: &str) -> Result<CommitId> {
        self.record(format!("commit {message}"));
        self.check("commit")?;
        Ok(CommitId("newsha".into()))
    }

    fn add(&self, paths: &[&Path]) -> Result<()> {
        self.record(format!("add {}", paths.len()));
        self.check("add")
    }

    fn add_all(&self) -> Result<()> {
        self.record("add_all".into());
        self.check("add_all")
    }

    fn remove(&self, paths: &[&Path]) -> Result<()> {
        self.record(format!("remove {}", paths.len()));
        self.check("remove")
    }

    fn checkout(&self, reference: &str) -> Result<()> {
        self.record(format!("checkout {reference}"));
        self.check("checkout")
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        self.record(format!("create_branch {name}"));
        self.check("create_branch")
    }

    fn branches(&self) -> Result<Vec<Branch>> {
        self.record("branches".into());
        self.check("branches")?;
        Ok(vec![Branch::local("main")])
    }

    fn remote_branches(&self) -> Result<Vec<Branch>> {
        self.record("remote_branches".into());
        Ok(Vec::new())
    }

    fn current_branch(&self) -> Result<Option<Branch>> {
        self.record("current_branch".into());
        self.check("current_branch")?;
        Ok(Some(Branch::local("main")))
    }

    fn remotes(&self) -> Result<Vec<Remote>> {
        self.record("remotes".into());
        self.check("remotes")?;
        Ok(vec![Remote::new("origin", "https://example.com/repo.git")])
    }

    fn add_remote(&self, remote: &Remote) -> Result<()> {
        self.record(format!("add_remote {}", remote.name));
        self.check("add_remote")
    }

    fn remove_remote(&self, name: &str) -> Result<()> {
        self.record(format!("remove_remote {name}"));
        self.check("remove_remote")
    }

    fn set_default_remote(&self, remote: &Remote) -> Result<()> {
        self.record(format!("set_default_remote {}", remote.name));
        self.check("set_default_remote")
    }

    fn set_upstream_remote(&self, branch: &str, remote: &Remote) -> Result<()> {
        self.record(format!("set_upstream_remote {branch} {}", remote.name));
        self.check("set_upstream_remote")
    }

    fn fetch(&self, remote: &Remote, reference: &str, opts: &FetchOpts) -> Result<()> {
        self.record(format!(
            "fetch {} {reference} depth={:?} single_branch={}",
            remote.name, opts.depth, opts.single_branch
        ));
        self.check("fetch")
    }

    fn pull(&self, remote: &Remote, reference: &str) -> Result<()> {
        self.record(format!("pull {} {reference}", remote.name));
        self.check("pull")
    }

    fn push(&self, remote: &Remote, reference: &str) -> Result<()> {
        self.record(format!("push {} {reference}", remote.name));
        self.check("push")
    }

    fn file_status_matrix(&self, _filter: Option<&[&Path]>) -> Result<StatusMatrix> {
        self.record("file_status_matrix".into());
        self.check("file_status_matrix")?;
        Ok(StatusMatrix::new(vec![StatusRow {
            path: "edited.rs".into(),
            head: HeadStatus::Present,
            workdir: WorkdirStatus::Modified,
            stage: StageStatus::Unmodified,
        }]))
    }

    fn resolve_ref(&self, reference: &str) -> Result<Option<CommitId>> {
        self.record(format!("resolve_ref {reference}"));
        self.check("resolve_ref")?;
        Ok(Some(CommitId("headsha".into())))
    }

    fn branch_commits(&self, branch: &str, limit: usize) -> Result<Vec<Commit>> {
        self.record(format!("branch_commits {branch} {limit}"));
        Ok(vec![commit_named("b1")])
    }

    fn branch_differences(&self, local: &str, remote_ref: &str) -> Result<BranchDifferences> {
        self.record(format!("branch_differences {local} {remote_ref}"));
        self.check("branch_differences")?;
        Ok(BranchDifferences {
            ahead: vec![commit_named("a1")],
            behind: Vec::new(),
        })
    }

    fn log(&self) -> Result<Vec<Commit>> {
        self.record("log".into());
        self.check("log")?;
        Ok(vec![commit_named("c1")])
    }
}

fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not met in time");
        thread::sleep(Duration::from_millis(5));
    }
}

fn origin() -> Remote {
    Remote::new("origin", "https://example.com/repo.git")
}

/// Dispatches the event and blocks until the store has reduced it.
fn dispatch_and_settle(store: &Store, event: Event) {
    let rx = store.subscribe();
    store.dispatch(event);
    rx.recv_timeout(Duration::from_secs(5))
        .expect("store reduces dispatched event");
}

fn orchestrator(provider: Arc<ScriptedProvider>, host: Arc<MemoryHost>) -> Orchestrator {
    Orchestrator::new(
        Store::new(),
        provider as Arc<dyn GitProvider>,
        host as Arc<dyn PluginHost>,
        Arc::new(NoopAuth) as Arc<dyn AuthProvider>,
    )
}

#[test]
fn sync_with_failing_pull_makes_zero_push_calls() {
    let provider = ScriptedProvider::new().failing_on("pull");
    let store = Store::new();

    let result = run_sync(&provider, &store, &origin(), "main");

    assert!(result.is_err());
    assert_eq!(provider.count_prefix("pull"), 1);
    assert_eq!(provider.count_prefix("push"), 0);
}

#[test]
fn push_is_followed_by_exactly_one_shallow_fetch() {
    let provider = ScriptedProvider::new();
    let store = Store::new();
    let events = store.subscribe();

    run_push(&provider, &store, &origin(), "main").unwrap();

    let calls = provider.calls();
    let push_at = calls.iter().position(|c| c.starts_with("push")).unwrap();
    let fetches: Vec<usize> = calls
        .iter()
        .enumerate()
        .filter(|(_, c)| c.starts_with("fetch"))
        .map(|(i, _)| i)
        .collect();

    assert_eq!(fetches.len(), 1);
    assert!(fetches[0] > push_at);
    assert_eq!(
        calls[fetches[0]],
        "fetch origin main depth=Some(1) single_branch=true"
    );

    // The divergence reload lands before the operation resolves.
    events
        .recv_timeout(Duration::from_secs(5))
        .expect("divergence dispatched");
    wait_until(|| !store.snapshot().commits_ahead.is_empty());
}

#[test]
fn push_failure_dispatches_nothing() {
    let provider = ScriptedProvider::new().failing_on("push");
    let store = Store::new();

    let result = run_push(&provider, &store, &origin(), "main");

    assert!(result.is_err());
    assert_eq!(provider.count_prefix("fetch"), 0);
    assert!(store.snapshot().commits_ahead.is_empty());
}

#[test]
fn refresh_dispatches_matrix_and_log() {
    let provider = ScriptedProvider::new();
    let store = Store::new();

    run_refresh(&provider, &store, 1).unwrap();

    wait_until(|| {
        let snapshot = store.snapshot();
        snapshot.file_status.seq == 1 && !snapshot.commits.is_empty()
    });
}

#[test]
fn refresh_siblings_are_independent() {
    // A failing status matrix does not keep the log from loading, and the
    // failure is still reported.
    let provider = ScriptedProvider::new().failing_on("file_status_matrix");
    let store = Store::new();

    let result = run_refresh(&provider, &store, 1);

    assert!(result.is_err());
    assert_eq!(provider.count_prefix("log"), 1);
    wait_until(|| !store.snapshot().commits.is_empty());
    assert_eq!(store.snapshot().file_status.seq, 0);
}

#[test]
fn remote_precedence_prefers_upstream_over_default() {
    let provider = Arc::new(ScriptedProvider::new());
    let host = Arc::new(MemoryHost::default());
    let orchestrator = orchestrator(Arc::clone(&provider), host);
    let store = orchestrator.store().clone();

    let upstream = Remote::new("fork", "https://example.com/fork.git");
    dispatch_and_settle(
        &store,
        Event::UpstreamChanged {
            remote: Some(upstream.clone()),
        },
    );
    dispatch_and_settle(
        &store,
        Event::DefaultRemoteChanged {
            remote: Some(origin()),
        },
    );

    assert_eq!(orchestrator.active_remote(), Some(upstream));

    // The operation itself must target the same remote the UI reports.
    dispatch_and_settle(
        &store,
        Event::BranchesLoaded {
            branches: vec![Branch::local("main")],
            current: Some(Branch::local("main")),
        },
    );
    orchestrator.fetch(None).unwrap();
    wait_until(|| provider.calls().iter().any(|c| c.starts_with("fetch fork main")));

    dispatch_and_settle(&store, Event::UpstreamChanged { remote: None });
    assert_eq!(orchestrator.active_remote(), Some(origin()));
}

#[test]
fn sync_family_is_disabled_without_a_remote() {
    let provider = Arc::new(ScriptedProvider::new());
    let host = Arc::new(MemoryHost::default());
    let orchestrator = orchestrator(Arc::clone(&provider), host);

    let err = orchestrator.fetch(None).unwrap_err();
    assert!(matches!(err, Error::NoRemoteConfigured));
    assert!(provider.calls().is_empty());
}

#[test]
fn create_branch_rejects_blank_names_locally() {
    let provider = Arc::new(ScriptedProvider::new());
    let host = Arc::new(MemoryHost::default());
    let orchestrator = orchestrator(Arc::clone(&provider), host);
    let before = orchestrator.store().snapshot();

    let err = orchestrator.create_branch("   ").unwrap_err();

    assert!(matches!(err, Error::InvalidBranchName));
    // No provider round-trip and no dispatched event.
    assert!(provider.calls().is_empty());
    assert_eq!(orchestrator.store().snapshot(), before);
}

#[test]
fn create_branch_trims_and_reloads_branches() {
    let provider = Arc::new(ScriptedProvider::new());
    let host = Arc::new(MemoryHost::default());
    let orchestrator = orchestrator(Arc::clone(&provider), host);

    orchestrator.create_branch("  feature  ").unwrap();

    wait_until(|| provider.calls().iter().any(|c| c == "create_branch feature"));
    wait_until(|| !orchestrator.store().snapshot().branches.is_empty());
}

#[test]
fn sync_through_orchestrator_reports_pull_failure() {
    let provider = Arc::new(ScriptedProvider::new().failing_on("pull"));
    let host = Arc::new(MemoryHost::default());
    let orchestrator = orchestrator(Arc::clone(&provider), Arc::clone(&host));
    let store = orchestrator.store().clone();

    dispatch_and_settle(
        &store,
        Event::BranchesLoaded {
            branches: vec![Branch::local("main")],
            current: Some(Branch::local("main")),
        },
    );
    dispatch_and_settle(
        &store,
        Event::DefaultRemoteChanged {
            remote: Some(origin()),
        },
    );

    orchestrator.sync(None).unwrap();

    wait_until(|| !host.alerts().is_empty());
    assert_eq!(provider.count_prefix("push"), 0);
    wait_until(|| {
        host.statuses()
            .iter()
            .any(|(key, kind, _)| key == "sync" && *kind == StatusKind::Error)
    });
    // The last known-good snapshot survives the failure.
    assert!(store.snapshot().commits_ahead.is_empty());
}

#[test]
fn plugin_connected_sets_one_way_loader_flag() {
    let provider = Arc::new(ScriptedProvider::new());
    let host = Arc::new(MemoryHost::default());
    let orchestrator = orchestrator(provider, host);

    orchestrator.handle_host_message("plugin-connected").unwrap();

    wait_until(|| {
        let snapshot = orchestrator.store().snapshot();
        snapshot.loader.plugin && snapshot.can_use_app
    });
}

#[test]
fn unknown_host_message_is_rejected() {
    let provider = Arc::new(ScriptedProvider::new());
    let host = Arc::new(MemoryHost::default());
    let orchestrator = orchestrator(Arc::clone(&provider), host);
    let before = orchestrator.store().snapshot();

    let err = orchestrator.handle_host_message("window-resized").unwrap_err();

    assert!(matches!(err, Error::UnknownEvent(tag) if tag == "window-resized"));
    assert!(provider.calls().is_empty());
    assert_eq!(orchestrator.store().snapshot(), before);
}

#[test]
fn save_credentials_persists_and_dispatches_together() {
    let provider = Arc::new(ScriptedProvider::new());
    let host = Arc::new(MemoryHost::default());
    let orchestrator = orchestrator(provider, Arc::clone(&host));

    orchestrator
        .save_credentials("octocat", "octo@cat.dev", "tok")
        .unwrap();

    wait_until(|| orchestrator.store().snapshot().github_user.is_some());
    let snapshot = orchestrator.store().snapshot();
    assert_eq!(snapshot.github_token.as_deref(), Some("tok"));
    assert_eq!(snapshot.user_emails.len(), 1);
    assert_eq!(
        host.setting(crate::credentials::USERNAME_KEY).as_deref(),
        Some("octocat")
    );

    orchestrator.remove_token().unwrap();
    wait_until(|| orchestrator.store().snapshot().github_user.is_none());
    assert_eq!(host.setting(crate::credentials::TOKEN_KEY), None);
}

#[test]
fn remove_remote_clears_dangling_references() {
    let provider = Arc::new(ScriptedProvider::new());
    let host = Arc::new(MemoryHost::default());
    let orchestrator = orchestrator(Arc::clone(&provider), host);
    let store = orchestrator.store().clone();

    let fork = Remote::new("fork", "https://example.com/fork.git");
    dispatch_and_settle(
        &store,
        Event::DefaultRemoteChanged {
            remote: Some(fork.clone()),
        },
    );
    dispatch_and_settle(
        &store,
        Event::UpstreamChanged {
            remote: Some(fork),
        },
    );

    orchestrator.remove_remote("fork".into());

    wait_until(|| {
        let snapshot = store.snapshot();
        snapshot.default_remote.is_none() && snapshot.upstream.is_none()
    });
}

#[test]
fn device_poll_results_are_plain_data() {
    // Guards the auth boundary contract used by the orchestrator wiring.
    let authorized = DevicePoll::Authorized {
        token: "tok".into(),
    };
    assert_ne!(authorized, DevicePoll::AuthorizationPending);
}
