//! REST client for the Attest intake backend.
//!
//! Implements the [`IntakeBackend`] contract from `attest-core` over the
//! five intake endpoints. One module per endpoint cluster; shared HTTP
//! plumbing and error mapping in [`http`].
//!
//! [`IntakeBackend`]: attest_core::backend::IntakeBackend

mod attachment;
mod config;
mod enhance;
mod http;
mod report;
mod step;

pub use config::BackendConfig;
pub use http::IntakeApiClient;
