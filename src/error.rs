//! Error types shared by the selector, aggregator, and report pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to the remote station directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("directory returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StationsError {
    #[error("closing hour {closes} must be after opening hour {opens}")]
    InvalidWindow { opens: u8, closes: u8 },

    #[error("invalid station number '{0}': expected a positive integer")]
    InvalidStationNumber(String),

    #[error("invalid number of address value parameters: provided {0}, at least 4 required")]
    IncompleteAddress(usize),

    #[error("average load is undefined: {samples} samples do not cover one {hours_per_day}-hour day")]
    DivisionUndefined { samples: usize, hours_per_day: u8 },

    #[error("station lookup needs an id, an address, or both a region code and a station number")]
    MissingLookup,

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("station directory unavailable: {0}")]
    RemoteUnavailable(#[from] DirectoryError),
}

pub type Result<T> = std::result::Result<T, StationsError>;
