//! Client-side session state.
//!
//! DESIGN
//! ======
//! `session` owns the data (user, token, loading flag) and its persistence;
//! `auth` owns the transitions and their user-facing outcomes.

pub mod auth;
pub mod session;
