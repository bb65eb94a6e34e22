use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// Fatal faults of the record stream. Each carries the byte offset where
/// reading stopped.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed XML at byte {position}: {source}")]
    Tokenize {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed attribute at byte {position}: {source}")]
    Attribute {
        position: u64,
        #[source]
        source: AttrError,
    },

    #[error("input ended at byte {position} inside <{open}>")]
    UnexpectedEof { position: u64, open: String },

    #[error("record <{inner}> opened inside record <{outer}> at byte {position}")]
    NestedRecord {
        position: u64,
        outer: String,
        inner: String,
    },

    #[error("</{found}> at byte {position} does not close <{open}>")]
    UnbalancedClose {
        position: u64,
        open: String,
        found: String,
    },
}

impl ParseError {
    pub fn position(&self) -> u64 {
        match self {
            ParseError::Tokenize { position, .. }
            | ParseError::Attribute { position, .. }
            | ParseError::UnexpectedEof { position, .. }
            | ParseError::NestedRecord { position, .. }
            | ParseError::UnbalancedClose { position, .. } => *position,
        }
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("download of {url} failed with status {status}")]
    Status { url: String, status: u16 },
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
