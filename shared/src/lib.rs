//! Types shared between office-server and its clients.
//!
//! Keeps the API DTOs and real-time payloads in one place so the admin
//! frontend and the field-employee app can depend on the same definitions.

pub mod client;
pub mod message;
pub mod util;

pub use client::{ChangePasswordRequest, LoginRequest, LoginResponse, SignupRequest, UserInfo};
pub use message::TaskCommentPayload;
pub use util::now_ms;
