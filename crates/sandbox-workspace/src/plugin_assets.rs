use std::path::Path;

use tracing::{debug, warn};

/// Tool script copied into `<workspace>/.opencode/tool/`.
const PLUGIN_TOOL_FILE: &str = "create-pull-request.js";
/// Directory of global modules symlinked so the agent resolves imports
/// without running a package install at startup.
const GLOBAL_NODE_MODULES: &str = "/usr/lib/node_modules";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginAssetsOutcome {
    pub tool_copied: bool,
    pub symlink_created: bool,
    pub package_json_written: bool,
}

/// Stages `.opencode/tool/`, a `node_modules` symlink to the global modules
/// directory, and a minimal `package.json` so the agent resolves plugin
/// imports without installing packages of its own at startup.
///
/// Grounded directly on `start_opencode()`'s asset-staging block: copy the
/// plugin script, symlink-if-absent, write `package.json` only if it is not
/// already there. None of these steps are fatal; a missing `plugin_source`
/// simply skips the whole operation (nothing to stage).
pub async fn install_plugin_assets(workdir: &Path, plugin_source: &Path) -> PluginAssetsOutcome {
    if !plugin_source.exists() {
        debug!(source = %plugin_source.display(), "opencode.plugin_skip reason=source_missing");
        return PluginAssetsOutcome {
            tool_copied: false,
            symlink_created: false,
            package_json_written: false,
        };
    }

    let opencode_dir = workdir.join(".opencode");
    let tool_dir = opencode_dir.join("tool");
    if let Err(e) = tokio::fs::create_dir_all(&tool_dir).await {
        warn!(error = %e, "opencode.tool_dir_error");
        return PluginAssetsOutcome {
            tool_copied: false,
            symlink_created: false,
            package_json_written: false,
        };
    }

    let tool_dest = tool_dir.join(PLUGIN_TOOL_FILE);
    let tool_copied = match tokio::fs::copy(plugin_source, &tool_dest).await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "opencode.tool_copy_error");
            false
        }
    };

    let node_modules = opencode_dir.join("node_modules");
    let global_modules = Path::new(GLOBAL_NODE_MODULES);
    let symlink_created = if !node_modules.exists() && global_modules.exists() {
        match symlink(global_modules, &node_modules).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "opencode.symlink_error");
                false
            }
        }
    } else {
        false
    };

    let package_json = opencode_dir.join("package.json");
    let package_json_written = if !package_json.exists() {
        match tokio::fs::write(&package_json, r#"{"name": "opencode-tools", "type": "module"}"#)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "opencode.package_json_error");
                false
            }
        }
    } else {
        false
    };

    PluginAssetsOutcome {
        tool_copied,
        symlink_created,
        package_json_written,
    }
}

#[cfg(unix)]
async fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    tokio::fs::symlink(original, link).await
}

#[cfg(not(unix))]
async fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    tokio::fs::symlink_dir(original, link).await
}
