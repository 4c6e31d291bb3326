//! Polling-station attendance queries and reports.
//!
//! [`selector`] turns operator filters into stations, [`stats`] summarises
//! hourly attendance, and [`report`] ties both together into a text report.

pub mod config;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod model;
pub mod output;
pub mod report;
pub mod selector;
pub mod services;
pub mod stats;

pub use error::{DirectoryError, Result, StationsError};
