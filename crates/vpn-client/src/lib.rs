//! VPN Sentinel client agent: periodic self-measurement, payload assembly
//! and submission, and a local health endpoint, all owned by one
//! supervisor loop.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod health_endpoint;
pub mod payload;
pub mod supervisor;
