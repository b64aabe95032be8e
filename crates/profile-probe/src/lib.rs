//! profile-probe: authenticated profile-fetch client with pluggable field extraction.
//!
//! The flow is: [`build_session`] → [`validate`] → [`fetch_profile`] →
//! [`extract`]. Each step is usable on its own.

pub mod config;
pub mod connections;
pub mod extract;
pub mod fetch;
pub mod session;
pub mod types;

pub use config::{resolve_config, ClientConfig, LogConfig, ProfileEndpoint};
pub use connections::{ConnectionSource, HttpConnectionSource};
pub use extract::extract;
pub use fetch::fetch_profile;
pub use session::{build_session, validate, ClientContext};
pub use types::*;
