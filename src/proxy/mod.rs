//! Upstream forwarding.
//!
//! Decides nothing itself; the router hands over requests whose path matched
//! a configured prefix, and this module relays them to the backend origin
//! with the Host header rewritten and TLS verification disabled.

pub mod origin;
pub mod routes;
pub mod tls;
pub mod upstream;

pub use origin::TargetOrigin;
pub use routes::RouteTable;
pub use upstream::ProxyHandler;
