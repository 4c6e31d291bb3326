pub mod client;

pub use client::StationsApiClient;
