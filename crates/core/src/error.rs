/// Errors raised while converting wire arguments into typed records.
///
/// `field` names are the positional meaning of the argument (e.g.
/// `"frame"`, `"ocapId"`), not its index, so log lines stay readable when
/// the producer's layout shifts.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Fewer arguments than the command's layout requires.
    #[error("Insufficient fields: got {got}, need {need}")]
    InsufficientFields { got: usize, need: usize },

    /// A numeric argument was empty, fractional where an integer was
    /// expected, negative where unsigned was expected, or not a number.
    #[error("Invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// A boolean argument was neither `true` nor `false`.
    #[error("Invalid bool for {field}: {value:?}")]
    InvalidBool { field: &'static str, value: String },

    /// An `x,y[,z]` coordinate string could not be parsed.
    #[error("Invalid coordinates: {0:?}")]
    InvalidPosition(String),

    /// A polyline was not a JSON array of at least two `[x,y]` pairs.
    #[error("Invalid polyline: {0}")]
    InvalidPolyline(String),

    /// An embedded JSON blob was malformed.
    #[error("Invalid JSON in {field}: {source}")]
    InvalidJson {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A required field of a JSON object argument was absent.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// A field was present but had the wrong shape.
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}
