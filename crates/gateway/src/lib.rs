//! Depot gateway: the HTTP retrieval surface over the storage core.
//!
//! The gateway exposes one public endpoint, `GET /file`, guarded by an
//! ordered chain of access policies: authenticated users first, remote
//! token holders second. Wins are audited in the access log; everything
//! else is an opaque 401 or 404. Grant issuance and per-action URL
//! building live here too, since both need the public base URL.

pub mod access;
pub mod config;
pub mod grants;
pub mod http;
pub mod session;
pub mod state;
pub mod thumbnail;

pub use config::Config;
pub use grants::IssuedGrant;
pub use state::{State as ServiceState, StateSetupError};
