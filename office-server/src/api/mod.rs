//! HTTP API modules
//!
//! Each resource gets its own module with a `router()` mounted under
//! `/api/<resource>`. Role gates live in the module's route table, the JWT
//! check itself is a router-level layer (see [`crate::core::server`]).

pub mod auth;
pub mod categories;
pub mod collectors;
pub mod company;
pub mod customers;
pub mod employee;
pub mod health;
pub mod invoices;
pub mod roles;
pub mod services;
pub mod tasks;
pub mod users;
pub mod zones;
