//! Real-time event payloads
//!
//! Typed payloads for the Socket.IO channel. The admin frontend joins the
//! `admin` room and receives these as they happen.

use serde::{Deserialize, Serialize};

/// Room every admin console joins on connect.
pub const ADMIN_ROOM: &str = "admin";

/// Event name for employee comments on tasks.
pub const TASK_COMMENT_EVENT: &str = "task:comment";

/// Payload broadcast when an employee comments on a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCommentPayload {
    /// Task record id ("task:xxxx")
    pub task_id: String,
    /// Commenting user record id ("user:xxxx")
    pub user_id: String,
    pub message: String,
    /// Unix millis
    pub created_at: i64,
}
