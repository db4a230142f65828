//! Persistence and identity layer: accounts and authentication, session
//! identity, per-user profiles, contact messages and the product catalog,
//! all on PostgreSQL via `sqlx`.
//!
//! Every store operation takes the pool explicitly and never returns a raw
//! storage error; faults are logged and mapped to `None`, `false`, `0`, an
//! empty list or [`error::RegistrationError::Failed`].

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod profiles;
pub mod records;
pub mod state;
pub mod validation;
