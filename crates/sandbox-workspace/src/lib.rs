//! Workspace preparation: git clone/sync, commit identity, the repo's own
//! setup hook, and staging the agent's plugin assets so it can resolve
//! imports without installing packages at startup.

mod git;
mod plugin_assets;
mod setup;

pub use git::{configure_identity, sync, verify_local_mount, GitSyncOutcome};
pub use plugin_assets::{install_plugin_assets, PluginAssetsOutcome};
pub use setup::{run_setup_hook, SetupOutcome};
