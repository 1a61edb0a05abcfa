mod file_host;
mod memory_host;
mod noop;

pub use file_host::FileHost;
pub use memory_host::{HostCall, MemoryHost};
pub use noop::{NoopAuth, NoopProvider};

use gitdock_core::services::GitProvider;
use std::sync::Arc;

/// Provider to fall back on when no engine is wired up; every operation
/// reports itself as unsupported.
pub fn noop_provider() -> Arc<dyn GitProvider> {
    Arc::new(NoopProvider)
}
