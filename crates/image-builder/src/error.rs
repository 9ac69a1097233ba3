/// Anything that can go wrong in a single build attempt. Never reported
/// structurally to the control plane — only via `.to_string()` in the
/// failure callback's `error` field, matching the Python original's
/// `except Exception as e: ... error=str(e)`.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Build sandbox exited with code {}", .0.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    NonZeroExit(Option<i32>),
    #[error(transparent)]
    Provider(#[from] sandbox_provider::ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonzero_exit_message_renders_the_bare_integer() {
        let err = BuildError::NonZeroExit(Some(7));
        assert_eq!(err.to_string(), "Build sandbox exited with code 7");
    }

    #[test]
    fn nonzero_exit_message_degrades_when_no_code_is_available() {
        let err = BuildError::NonZeroExit(None);
        assert_eq!(err.to_string(), "Build sandbox exited with code unknown");
    }
}
