use std::env;

use sandbox_types::Credentials;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("INTERNAL_API_SECRET must be set and non-empty")]
    MissingInternalSecret,
    #[error("SANDBOX_PROVIDER_URL must be set and non-empty")]
    MissingProviderUrl,
}

/// Immutable image-builder configuration, parsed once from the environment.
///
/// Mirrors the supervisor's `SupervisorConfig::from_env` shape: one struct
/// built at process start and passed down by value, rather than leaf code
/// re-reading `std::env`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Shared secret `generate_internal_token` signs callback bearer tokens
    /// with. Unlike the supervisor's optional credentials, this is required:
    /// an image builder that can't authenticate its callback can't report
    /// anything useful.
    pub internal_secret: Vec<u8>,
    /// GitHub App credentials used to mint a clone token per build. Absent
    /// entirely degrades to an unauthenticated clone (public repos only),
    /// matching the Python original's best-effort `try/except` around
    /// `generate_installation_token`.
    pub credentials: Option<Credentials>,
    /// Base URL of the sandbox-provider backend the build worker talks to
    /// via [`sandbox_provider::HttpSandboxProvider`]. Required: a builder
    /// with nowhere to create a sandbox has nothing to do.
    pub provider_url: String,
}

impl BuilderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let non_empty = |key: &str| -> Option<String> {
            env::var(key).ok().filter(|v| !v.is_empty())
        };

        let internal_secret = non_empty("INTERNAL_API_SECRET")
            .ok_or(ConfigError::MissingInternalSecret)?
            .into_bytes();

        let provider_url = non_empty("SANDBOX_PROVIDER_URL").ok_or(ConfigError::MissingProviderUrl)?;

        let credentials = non_empty("GITHUB_APP_TOKEN")
            .map(Credentials::Preissued)
            .or_else(|| {
                match (
                    non_empty("GITHUB_APP_ID"),
                    non_empty("GITHUB_APP_PRIVATE_KEY"),
                    non_empty("GITHUB_APP_INSTALLATION_ID"),
                ) {
                    (Some(app_id), Some(private_key), Some(installation_id)) => {
                        Some(Credentials::App {
                            app_id,
                            private_key,
                            installation_id,
                        })
                    }
                    _ => None,
                }
            });

        Ok(Self {
            internal_secret,
            credentials,
            provider_url,
        })
    }
}
