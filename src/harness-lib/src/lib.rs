//! Configuration-driven HTTP API test harness.
//!
//! Resolve a [`config::ResolvedConfig`] with [`config::ConfigLoader`], build per-service
//! clients through [`client::ClientFactory`], check responses with [`assertion`] rules,
//! and run YAML case files with [`suite::SuiteRunner`].

pub mod assertion;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod http;
pub mod report;
pub mod suite;
