//! Core types, services and trait definitions for the Furlough leave-request
//! service.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! [`directory::AccountDirectory`] and [`lifecycle::PermissionLifecycle`]
//! services hold every business rule and reach storage only through the
//! traits in [`store`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod credentials;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod page;
pub mod permission;
pub mod store;

pub use error::{Error, FieldError, Result};
