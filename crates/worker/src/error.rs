use ocap_core::types::ObjectId;
use ocap_core::ParseError;
use ocap_storage::StorageError;

/// Failures of a single handler invocation.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The command's arguments did not parse.
    #[error("{command}: {source}")]
    Parse {
        command: &'static str,
        #[source]
        source: ParseError,
    },

    /// The record refers to something not registered in this mission.
    #[error("{command}: {kind} {id} not registered")]
    MissingReference {
        command: &'static str,
        kind: &'static str,
        id: String,
    },

    #[error("Storage error: {0}")]
    Backend(#[from] StorageError),
}

impl WorkerError {
    pub(crate) fn missing(command: &'static str, kind: &'static str, id: ObjectId) -> Self {
        Self::MissingReference {
            command,
            kind,
            id: id.to_string(),
        }
    }
}
