use gitdock_core::domain::GitHubUser;
use gitdock_core::services::{PluginHost, Result};
use std::sync::Arc;

pub const USERNAME_KEY: &str = "settings/github-user-name";
pub const EMAIL_KEY: &str = "settings/github-email";
pub const TOKEN_KEY: &str = "settings/gist-access-token";

/// The persisted GitHub identity. Outlives the in-memory repository state;
/// absence is the normal fresh-install condition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CredentialRecord {
    pub username: String,
    pub email: String,
    pub token: String,
}

/// Persists GitHub identity through the host settings surface. Username,
/// email, and token always move together: partial credential states are not
/// a supported transition.
#[derive(Clone)]
pub struct CredentialStore {
    host: Arc<dyn PluginHost>,
}

impl CredentialStore {
    pub fn new(host: Arc<dyn PluginHost>) -> Self {
        Self { host }
    }

    pub fn save(&self, username: &str, email: &str, token: &str) -> Result<()> {
        self.host.settings_set(USERNAME_KEY, username)?;
        self.host.settings_set(EMAIL_KEY, email)?;
        self.host.settings_set(TOKEN_KEY, token)?;
        Ok(())
    }

    pub fn remove(&self) -> Result<()> {
        self.host.settings_remove(USERNAME_KEY)?;
        self.host.settings_remove(EMAIL_KEY)?;
        self.host.settings_remove(TOKEN_KEY)?;
        Ok(())
    }

    /// A record is only returned when both username and token are present;
    /// anything less reads as "no credentials configured".
    pub fn load(&self) -> Result<Option<CredentialRecord>> {
        let username = self.host.settings_get(USERNAME_KEY)?.unwrap_or_default();
        let email = self.host.settings_get(EMAIL_KEY)?.unwrap_or_default();
        let token = self.host.settings_get(TOKEN_KEY)?.unwrap_or_default();

        if username.trim().is_empty() || token.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(CredentialRecord {
            username,
            email,
            token,
        }))
    }
}

/// A present user with an empty recorded scope list is scope-warned. This is
/// a non-fatal warning surfaced to the UI, never an error.
pub fn has_valid_scopes(user: Option<&GitHubUser>, scopes: &[String]) -> bool {
    !(user.is_some() && scopes.is_empty())
}
