use gitdock_core::domain::*;
use gitdock_core::error::Error;
use gitdock_core::services::{AuthProvider, DevicePoll, GitProvider, Result};
use std::path::Path;

const NO_ENGINE: &str = "no version-control engine attached";

#[derive(Default)]
pub struct NoopProvider;

impl GitProvider for NoopProvider {
    fn init(&self) -> Result<()> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn clone_repo(&self, _url: &str, _opts: &CloneOpts) -> Result<()> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn commit(&self, _message: &str) -> Result<CommitId> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn add(&self, _paths: &[&Path]) -> Result<()> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn add_all(&self) -> Result<()> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn remove(&self, _paths: &[&Path]) -> Result<()> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn checkout(&self, _reference: &str) -> Result<()> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn create_branch(&self, _name: &str) -> Result<()> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn branches(&self) -> Result<Vec<Branch>> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn remote_branches(&self) -> Result<Vec<Branch>> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn current_branch(&self) -> Result<Option<Branch>> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn remotes(&self) -> Result<Vec<Remote>> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn add_remote(&self, _remote: &Remote) -> Result<()> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn remove_remote(&self, _name: &str) -> Result<()> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn set_default_remote(&self, _remote: &Remote) -> Result<()> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn set_upstream_remote(&self, _branch: &str, _remote: &Remote) -> Result<()> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn fetch(&self, _remote: &Remote, _reference: &str, _opts: &FetchOpts) -> Result<()> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn pull(&self, _remote: &Remote, _reference: &str) -> Result<()> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn push(&self, _remote: &Remote, _reference: &str) -> Result<()> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn file_status_matrix(&self, _filter: Option<&[&Path]>) -> Result<StatusMatrix> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn resolve_ref(&self, _reference: &str) -> Result<Option<CommitId>> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn branch_commits(&self, _branch: &str, _limit: usize) -> Result<Vec<Commit>> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn branch_differences(&self, _local: &str, _remote_ref: &str) -> Result<BranchDifferences> {
        Err(Error::Unsupported(NO_ENGINE))
    }

    fn log(&self) -> Result<Vec<Commit>> {
        Err(Error::Unsupported(NO_ENGINE))
    }
}

#[derive(Default)]
pub struct NoopAuth;

impl AuthProvider for NoopAuth {
    fn begin_device_flow(&self) -> Result<DeviceCodeGrant> {
        Err(Error::Unsupported("no auth provider attached"))
    }

    fn poll_device_token(&self, _device_code: &str) -> Result<DevicePoll> {
        Err(Error::Unsupported("no auth provider attached"))
    }

    fn fetch_profile(&self, _token: &str) -> Result<GitHubProfile> {
        Err(Error::Unsupported("no auth provider attached"))
    }
}
