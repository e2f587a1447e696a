//! # classhub
//!
//! Client for the class-community backend: classmates, activities, photo
//! and video media, comments, and notifications over REST.
//!
//! The crate holds the client core a UI sits on top of: configuration, a
//! bearer-token HTTP client with centralized error reporting, typed API
//! namespaces, the session/auth store, and a guarded router. The
//! `classhub` binary drives the same core from the command line.

pub mod app;
pub mod config;
pub mod net;
pub mod notify;
pub mod router;
pub mod state;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use app::App;
pub use config::AppConfig;
