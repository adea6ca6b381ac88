//! devproxy - Front-end Development Server
//!
//! Serves static assets locally and forwards configured path prefixes to a
//! backend origin during development.

pub mod config;
pub mod http;
pub mod proxy;
pub mod router;
pub mod server;
pub mod static_files;
