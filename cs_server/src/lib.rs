//! HTTP server for the Chefshare authentication core.

pub mod api;
pub mod config;
pub mod logging;
