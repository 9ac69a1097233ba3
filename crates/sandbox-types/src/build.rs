use serde::Serialize;
use std::collections::HashMap;

/// Input to the image builder, as received from the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub build_id: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub default_branch: String,
    pub callback_url: String,
    pub env_overrides: Option<HashMap<String, String>>,
}

impl BuildRequest {
    /// The failure-callback URL, derived by swapping the well-known success
    /// suffix. This is only ever called on the failure path; an empty
    /// `callback_url` is handled by the caller before reaching here.
    pub fn failure_callback_url(&self) -> String {
        self.callback_url.replace("/build-complete", "/build-failed")
    }
}

/// Outcome of a build, and the one JSON body that gets POSTed for it.
///
/// Modeled as an enum (rather than two independent booleans) so that
/// "exactly one callback kind per build" is enforced by construction: there
/// is only ever one value here, and it routes to exactly one callback.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Success {
        build_id: String,
        provider_image_id: String,
        base_sha: String,
        build_duration_seconds: f64,
    },
    Failure {
        build_id: String,
        error: String,
    },
}

impl BuildOutcome {
    pub fn success(
        build_id: impl Into<String>,
        provider_image_id: impl Into<String>,
        base_sha: impl Into<String>,
        build_duration_seconds: f64,
    ) -> Self {
        Self::Success {
            build_id: build_id.into(),
            provider_image_id: provider_image_id.into(),
            base_sha: base_sha.into(),
            build_duration_seconds: round_two_decimals(build_duration_seconds),
        }
    }

    pub fn failure(build_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Failure {
            build_id: build_id.into(),
            error: error.into(),
        }
    }

    pub fn to_payload(&self) -> serde_json::Value {
        #[derive(Serialize)]
        struct SuccessPayload<'a> {
            build_id: &'a str,
            provider_image_id: &'a str,
            base_sha: &'a str,
            build_duration_seconds: f64,
        }
        #[derive(Serialize)]
        struct FailurePayload<'a> {
            build_id: &'a str,
            error: &'a str,
        }

        match self {
            BuildOutcome::Success {
                build_id,
                provider_image_id,
                base_sha,
                build_duration_seconds,
            } => serde_json::to_value(SuccessPayload {
                build_id,
                provider_image_id,
                base_sha,
                build_duration_seconds: *build_duration_seconds,
            })
            .expect("BuildOutcome::Success always serializes"),
            BuildOutcome::Failure { build_id, error } => {
                serde_json::to_value(FailurePayload { build_id, error })
                    .expect("BuildOutcome::Failure always serializes")
            }
        }
    }
}

fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_url_swaps_suffix() {
        let req = BuildRequest {
            build_id: "b-1".into(),
            repo_owner: "acme".into(),
            repo_name: "widget".into(),
            default_branch: "main".into(),
            callback_url: "https://cp/builds/b-1/build-complete".into(),
            env_overrides: None,
        };
        assert_eq!(
            req.failure_callback_url(),
            "https://cp/builds/b-1/build-failed"
        );
    }

    #[test]
    fn success_payload_shape() {
        let outcome = BuildOutcome::success("b-1", "img-xyz", "abc123", 42.345);
        let payload = outcome.to_payload();
        assert_eq!(payload["build_id"], "b-1");
        assert_eq!(payload["provider_image_id"], "img-xyz");
        assert_eq!(payload["base_sha"], "abc123");
        assert_eq!(payload["build_duration_seconds"], 42.35);
    }

    #[test]
    fn failure_payload_shape() {
        let outcome = BuildOutcome::failure("b-1", "Build sandbox exited with code 7");
        let payload = outcome.to_payload();
        assert_eq!(payload["build_id"], "b-1");
        assert_eq!(payload["error"], "Build sandbox exited with code 7");
        assert!(payload.get("provider_image_id").is_none());
    }
}
