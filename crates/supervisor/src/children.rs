use std::collections::HashMap;
use std::path::Path;

use sandbox_process::SpawnSpec;
use sandbox_types::SupervisorConfig;
use serde_json::json;

/// Disables the agent's interactive-question affordance: the tool would
/// otherwise block on a Promise waiting for user input via the HTTP API,
/// but in a headless sandbox there is no channel to relay the question to
/// a client and back. Without this the session hangs until its own
/// inactivity timeout.
const AGENT_CLIENT_MODE: &str = "serve";

/// Builds the agent server's [`SpawnSpec`]: `AGENT_CONFIG_CONTENT` carries
/// the `provider/model` pair and a blanket permission grant (this sandbox
/// *is* the permission boundary; the agent doesn't need its own prompt),
/// `SESSION_CONFIG` carries the session fields the agent's own plugin tools
/// read back out of the environment.
pub fn agent_spawn_spec(config: &SupervisorConfig, workdir: &Path) -> SpawnSpec {
    let agent_config = json!({
        "model": format!("{}/{}", config.provider, config.model),
        "permission": { "*": { "*": "allow" } },
    });

    let session_config = json!({
        "session_id": config.session_id,
        "repo_owner": config.repo_owner,
        "repo_name": config.repo_name,
        "provider": config.provider,
        "model": config.model,
    });

    let mut env = HashMap::new();
    env.insert(
        "AGENT_CONFIG_CONTENT".to_string(),
        agent_config.to_string(),
    );
    env.insert("SESSION_CONFIG".to_string(), session_config.to_string());
    env.insert("AGENT_CLIENT".to_string(), AGENT_CLIENT_MODE.to_string());

    SpawnSpec::new(config.agent_bin.clone())
        .arg("serve")
        .arg("--port")
        .arg(config.agent_port.to_string())
        .arg("--hostname")
        .arg("0.0.0.0")
        .arg("--print-logs")
        .cwd(workdir.to_path_buf())
        .envs(env)
        .log_prefix("agent")
}

/// Builds the bridge's [`SpawnSpec`]. Only called once `control_plane_url`
/// and `session_id` are both known to be present (checked by the startup
/// routine before this is reached).
pub fn bridge_spawn_spec(config: &SupervisorConfig, control_plane_url: &str) -> SpawnSpec {
    SpawnSpec::new(config.bridge_bin.clone())
        .arg("--sandbox-id")
        .arg(&config.sandbox_id)
        .arg("--session-id")
        .arg(&config.session_id)
        .arg("--control-plane")
        .arg(control_plane_url)
        .arg("--token")
        .arg(&config.sandbox_auth_token)
        .arg("--agent-port")
        .arg(config.agent_port.to_string())
        .log_prefix("bridge")
}
