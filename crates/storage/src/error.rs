/// Errors a storage backend can return to the worker.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// `EndMission` (or another mission-scoped call) with no mission started.
    #[error("No active mission")]
    NoActiveMission,

    /// Creating the output directory or writing the artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The export structure could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
