use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("article content must start with an `<!--` metadata block")]
    MissingMetaBlock,

    #[error("no level-1 `# title` heading follows the metadata block")]
    MissingTitle,

    #[error("tag entry must be a scalar or a single-key mapping, got: {0}")]
    InvalidTagFormat(String),

    #[error("workspace id `{0}` cannot be used as a directory name")]
    InvalidWorkspaceId(String),

    #[error("article has no remote id; create it before updating or deleting")]
    EmptyId,

    #[error("remote error [{kind}]: {message}")]
    Response { kind: String, message: String },

    #[error("remote request failed with HTTP {status}")]
    Status { status: u16 },

    #[error("listing response has a missing or non-numeric total count header: {0:?}")]
    InvalidTotalCount(Option<String>),

    #[error("listing returned {actual} items but reported a total of {expected}")]
    TotalCountMismatch { expected: usize, actual: usize },

    #[error("invalid timestamp `{value}`: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode metadata block: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to decode JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to parse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{0} is required to call the remote API")]
    MissingCredential(&'static str),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
