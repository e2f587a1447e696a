//! Network layer: wire types, error taxonomy, HTTP client, and API namespaces.

pub mod api;
pub mod error;
pub mod http;
pub mod types;
