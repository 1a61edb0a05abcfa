use gitdock_core::domain::{DeviceCodeGrant, GitHubProfile};
use gitdock_core::error::Error;
use gitdock_core::services::{AuthProvider, DevicePoll, Result};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

/// GitHub asks clients to add five seconds to the interval after a
/// `slow_down` response.
const SLOW_DOWN_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeviceAuthPhase {
    Pending,
    Polling,
    Authorized,
    Denied,
    Expired,
    Failed,
}

#[derive(Debug)]
pub enum AuthOutcome {
    Authorized {
        token: String,
        profile: GitHubProfile,
    },
    Denied,
    Expired,
    Failed(Error),
}

enum ControlMsg {
    Stop,
}

/// The OAuth device-code flow as an owned state machine:
/// `pending → polling → authorized | denied | expired`. One worker thread
/// issues the polls; it stops on the first terminal result, when the code
/// expires, or when the handle is stopped or dropped. No poll is ever issued
/// after a terminal state.
pub struct DeviceAuthFlow {
    grant: DeviceCodeGrant,
    phase: Arc<Mutex<DeviceAuthPhase>>,
    control_tx: mpsc::Sender<ControlMsg>,
    join: Option<thread::JoinHandle<()>>,
}

impl DeviceAuthFlow {
    pub fn start(
        auth: Arc<dyn AuthProvider>,
        on_outcome: impl FnOnce(AuthOutcome) + Send + 'static,
    ) -> Result<Self> {
        let grant = auth.begin_device_flow()?;
        let phase = Arc::new(Mutex::new(DeviceAuthPhase::Pending));
        let (control_tx, control_rx) = mpsc::channel();

        let worker_grant = grant.clone();
        let worker_phase = Arc::clone(&phase);
        let join = thread::spawn(move || {
            if let Some(outcome) = poll_until_terminal(&*auth, &worker_grant, &worker_phase, &control_rx)
            {
                set_phase(&worker_phase, phase_of(&outcome));
                log::debug!("device flow finished: {outcome:?}");
                on_outcome(outcome);
            }
        });

        Ok(Self {
            grant,
            phase,
            control_tx,
            join: Some(join),
        })
    }

    /// The user-facing half of the grant (user code, verification URI).
    pub fn grant(&self) -> &DeviceCodeGrant {
        &self.grant
    }

    pub fn phase(&self) -> DeviceAuthPhase {
        *self.phase.lock().expect("phase lock poisoned")
    }

    pub fn stop(&mut self) {
        let _ = self.control_tx.send(ControlMsg::Stop);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for DeviceAuthFlow {
    fn drop(&mut self) {
        self.stop();
    }
}

fn phase_of(outcome: &AuthOutcome) -> DeviceAuthPhase {
    match outcome {
        AuthOutcome::Authorized { .. } => DeviceAuthPhase::Authorized,
        AuthOutcome::Denied => DeviceAuthPhase::Denied,
        AuthOutcome::Expired => DeviceAuthPhase::Expired,
        AuthOutcome::Failed(_) => DeviceAuthPhase::Failed,
    }
}

fn set_phase(phase: &Mutex<DeviceAuthPhase>, next: DeviceAuthPhase) {
    *phase.lock().expect("phase lock poisoned") = next;
}

/// Returns `None` when the flow was stopped from outside; no outcome is
/// reported in that case.
fn poll_until_terminal(
    auth: &dyn AuthProvider,
    grant: &DeviceCodeGrant,
    phase: &Mutex<DeviceAuthPhase>,
    control_rx: &mpsc::Receiver<ControlMsg>,
) -> Option<AuthOutcome> {
    let deadline = Instant::now() + Duration::from_secs(grant.expires_in_secs);
    let mut interval = Duration::from_secs(grant.interval_secs);

    set_phase(phase, DeviceAuthPhase::Polling);

    loop {
        match control_rx.recv_timeout(interval) {
            Ok(ControlMsg::Stop) | Err(mpsc::RecvTimeoutError::Disconnected) => return None,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
        }

        if Instant::now() >= deadline {
            return Some(AuthOutcome::Expired);
        }

        match auth.poll_device_token(&grant.device_code) {
            Ok(DevicePoll::AuthorizationPending) => {}
            Ok(DevicePoll::SlowDown) => interval += SLOW_DOWN_BACKOFF,
            Ok(DevicePoll::Authorized { token }) => {
                return Some(match auth.fetch_profile(&token) {
                    Ok(profile) => AuthOutcome::Authorized { token, profile },
                    Err(err) => AuthOutcome::Failed(err),
                });
            }
            Ok(DevicePoll::Denied) => return Some(AuthOutcome::Denied),
            Ok(DevicePoll::Expired) => return Some(AuthOutcome::Expired),
            Err(err) => return Some(AuthOutcome::Failed(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitdock_core::domain::{GitHubUser, UserEmail};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedAuth {
        polls: Mutex<VecDeque<DevicePoll>>,
        poll_count: AtomicUsize,
        expires_in_secs: u64,
    }

    impl ScriptedAuth {
        fn new(polls: Vec<DevicePoll>) -> Self {
            Self {
                polls: Mutex::new(polls.into()),
                poll_count: AtomicUsize::new(0),
                expires_in_secs: 60,
            }
        }
    }

    impl AuthProvider for ScriptedAuth {
        fn begin_device_flow(&self) -> Result<DeviceCodeGrant> {
            Ok(DeviceCodeGrant {
                device_code: "dev-code".into(),
                user_code: "ABCD-1234".into(),
                verification_uri: "https://github.com/login/device".into(),
                interval_secs: 0,
                expires_in_secs: self.expires_in_secs,
            })
        }

        fn poll_device_token(&self, _device_code: &str) -> Result<DevicePoll> {
            self.poll_count.fetch_add(1, Ordering::SeqCst);
            let mut polls = self.polls.lock().unwrap();
            Ok(polls
                .pop_front()
                .unwrap_or(DevicePoll::AuthorizationPending))
        }

        fn fetch_profile(&self, _token: &str) -> Result<GitHubProfile> {
            Ok(GitHubProfile {
                user: GitHubUser {
                    login: "octocat".into(),
                    name: None,
                },
                scopes: vec!["repo".into()],
                emails: vec![UserEmail {
                    email: "octo@cat.dev".into(),
                    primary: true,
                }],
            })
        }
    }

    fn run_to_outcome(auth: Arc<ScriptedAuth>) -> (AuthOutcome, DeviceAuthPhase, usize) {
        let (tx, rx) = mpsc::channel();
        let mut flow = DeviceAuthFlow::start(Arc::clone(&auth) as Arc<dyn AuthProvider>, move |o| {
            let _ = tx.send(o);
        })
        .unwrap();

        let outcome = rx.recv_timeout(Duration::from_secs(5)).expect("outcome");
        flow.stop();
        let phase = flow.phase();
        (outcome, phase, auth.poll_count.load(Ordering::SeqCst))
    }

    #[test]
    fn grant_surfaces_the_user_code() {
        let auth = Arc::new(ScriptedAuth::new(vec![DevicePoll::Denied]));
        let flow = DeviceAuthFlow::start(auth as Arc<dyn AuthProvider>, |_| {}).unwrap();
        assert_eq!(flow.grant().user_code, "ABCD-1234");
    }

    #[test]
    fn authorization_stops_polling_and_reports_profile() {
        let auth = Arc::new(ScriptedAuth::new(vec![
            DevicePoll::AuthorizationPending,
            DevicePoll::Authorized {
                token: "tok".into(),
            },
        ]));

        let (outcome, phase, polls) = run_to_outcome(auth);
        match outcome {
            AuthOutcome::Authorized { token, profile } => {
                assert_eq!(token, "tok");
                assert_eq!(profile.user.login, "octocat");
            }
            other => panic!("expected authorized, got {other:?}"),
        }
        assert_eq!(phase, DeviceAuthPhase::Authorized);
        // Exactly one poll past the pending one; nothing after the terminal
        // result.
        assert_eq!(polls, 2);
    }

    #[test]
    fn denial_is_terminal() {
        let auth = Arc::new(ScriptedAuth::new(vec![DevicePoll::Denied]));
        let (outcome, phase, polls) = run_to_outcome(auth);
        assert!(matches!(outcome, AuthOutcome::Denied));
        assert_eq!(phase, DeviceAuthPhase::Denied);
        assert_eq!(polls, 1);
    }

    #[test]
    fn expired_grant_never_polls() {
        let auth = Arc::new(ScriptedAuth {
            polls: Mutex::new(VecDeque::new()),
            poll_count: AtomicUsize::new(0),
            expires_in_secs: 0,
        });

        let (outcome, phase, polls) = run_to_outcome(auth);
        assert!(matches!(outcome, AuthOutcome::Expired));
        assert_eq!(phase, DeviceAuthPhase::Expired);
        assert_eq!(polls, 0);
    }

    #[test]
    fn dropping_the_handle_stops_the_flow_without_an_outcome() {
        let auth = Arc::new(ScriptedAuth::new(Vec::new()));
        let (tx, rx) = mpsc::channel();
        let flow = DeviceAuthFlow::start(Arc::clone(&auth) as Arc<dyn AuthProvider>, move |o| {
            let _ = tx.send(o);
        })
        .unwrap();

        // Endless pending polls; dropping must join the worker.
        drop(flow);
        assert!(rx.try_recv().is_err());
    }
}
