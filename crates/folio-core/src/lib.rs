//! Configuration, persona policy, the retrieve-then-generate pipeline, and
//! repository sync.

pub mod assistant;
pub mod bootstrap;
pub mod config;
pub mod persona;
pub mod pipeline;
pub mod profile;
pub mod skills;
pub mod sync;
pub mod vault;

pub use assistant::Assistant;
pub use config::Config;
pub use profile::UserProfile;
pub use sync::{RepoSelection, SyncError, SyncGuard, SyncRequest, SyncService};
