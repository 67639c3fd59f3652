//! GitHub-backed repository analytics.
//!
//! - [`client`]: octocrab client implementing [`provider::HostingProvider`]
//! - [`service`]: request-scoped operations with a per-request timeout
//! - [`routes`]: the `/github/...` route table and 400/404 translation

pub mod client;
pub mod provider;
pub mod routes;
pub mod service;
