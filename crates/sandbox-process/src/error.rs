#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to spawn {bin}: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to wait on process: {0}")]
    Wait(#[source] std::io::Error),
}
