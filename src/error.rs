use thiserror::Error;

/// Errors reported for semantic graph operations.
///
/// Geometry and layout never produce these: malformed visual inputs degrade to
/// default sizes instead. Only operations whose silent failure would corrupt
/// history or strategy selection surface an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("renderer not found: {0}")]
    RendererNotFound(String),

    #[error("serializer not found: {0}")]
    SerializerNotFound(String),

    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("malformed event payload: {0}")]
    MalformedEvent(String),

    #[error("event \"{0}\" is a UI notification and cannot be replayed")]
    NotReplayable(&'static str),

    #[error("stale reference: {kind} \"{id}\" no longer exists in the workspace")]
    StaleReference { kind: &'static str, id: String },

    #[error("duplicate {kind} id \"{id}\"")]
    DuplicateId { kind: &'static str, id: String },
}

pub type Result<T> = std::result::Result<T, Error>;
