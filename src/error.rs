#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("malformed account data: {reason}")]
    MalformedAccountData { reason: String },

    #[error("truncated account data: {reason}")]
    TruncatedAccountData { reason: String },

    #[error("malformed instruction: {reason}")]
    MalformedInstruction { reason: String },

    #[error("no valid program derived address for the given seeds")]
    NoValidAddress,

    #[error("invalid seeds: {reason}")]
    InvalidSeeds { reason: String },

    #[error("invalid address {value}: {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("dataset {dataset} unreadable: {reason}")]
    DatasetUnreadable { dataset: String, reason: String },

    #[error("transport error: {reason}")]
    Transport { reason: String },

    #[error("no classifier registered for marketplace {name}")]
    UnknownMarketplace { name: String },

    #[error("config error: {reason}")]
    Config { reason: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Failures worth retrying: the node was unreachable or sent an unreadable reply.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Json(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            reason: err.to_string(),
        }
    }
}
