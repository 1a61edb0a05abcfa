use crate::event::Event;
use crate::model::{FileStatusResult, RepositoryState};

/// Computes the next snapshot from an event. Pure: no side effects, no
/// clock, no dispatch. The same `(state, event)` pair always yields the
/// same output, which is what makes scripted replay in tests deterministic.
/// Side effects live in the orchestrator, which dispatches their *results*
/// here.
pub fn reduce(state: &RepositoryState, event: &Event) -> RepositoryState {
    let mut next = state.clone();

    match event {
        Event::PluginConnected => {
            // One-way for the session; nothing ever resets these.
            next.loader.plugin = true;
            next.can_use_app = true;
        }

        Event::BranchesLoaded { branches, current } => {
            next.branches = branches.clone();
            next.current_branch = current.clone();
        }

        Event::HeadResolved { head } => {
            next.current_head = head.clone();
        }

        Event::RemotesLoaded { remotes } => {
            next.remotes = remotes.clone();
        }

        Event::DefaultRemoteChanged { remote } => {
            next.default_remote = remote.clone();
        }

        Event::UpstreamChanged { remote } => {
            next.upstream = remote.clone();
        }

        Event::CommitsLoaded { commits } => {
            next.commits = commits.clone();
        }

        Event::RemoteCommitsLoaded { ahead, behind } => {
            // Replaced together: "ahead but unknown behind" is not a state
            // the panels may ever observe.
            next.commits_ahead = ahead.clone();
            next.commits_behind = behind.clone();
        }

        Event::RefreshIssued { seq } => {
            next.file_status_seq_issued = next.file_status_seq_issued.max(*seq);
        }

        Event::FileStatusLoaded { seq, matrix } => {
            // A slower result from a superseded refresh must not overwrite a
            // newer matrix that already resolved.
            if *seq >= next.file_status_seq_issued {
                next.file_status = FileStatusResult {
                    seq: *seq,
                    matrix: matrix.clone(),
                };
            }
        }

        Event::RepositoryInitialized { branch, head } => {
            next.current_branch = branch.clone();
            next.current_head = head.clone();
        }

        Event::CredentialsUpdated {
            user,
            token,
            scopes,
            emails,
        } => {
            next.github_user = Some(user.clone());
            next.github_token = Some(token.clone());
            next.github_scopes = scopes.clone();
            next.user_emails = emails.clone();
        }

        Event::CredentialsCleared => {
            next.github_user = None;
            next.github_token = None;
            next.github_scopes = Vec::new();
            next.user_emails = Vec::new();
        }
    }

    next
}
