//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Requires a valid JWT Bearer token and loads the viewer.
//! - [`auth::MaybeAuthUser`] -- Same, but anonymous readers are allowed.

pub mod auth;
