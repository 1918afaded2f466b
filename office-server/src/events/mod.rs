//! Realtime events
//!
//! Socket.IO bridge for the admin dashboard. Browsers join the `admin` room
//! and receive `task:comment` events when technicians comment from the
//! field.

use socketioxide::SocketIo;
use socketioxide::extract::{Data, SocketRef};
use socketioxide::layer::SocketIoLayer;

use shared::message::{ADMIN_ROOM, TASK_COMMENT_EVENT, TaskCommentPayload};

/// Socket.IO service shared through [`crate::core::ServerState`]
#[derive(Clone)]
pub struct EventsService {
    io: SocketIo,
}

impl EventsService {
    /// Build the service and its tower layer
    pub fn new_layer() -> (SocketIoLayer, Self) {
        let (layer, io) = SocketIo::new_layer();

        io.ns("/", async |socket: SocketRef| {
            tracing::debug!(sid = %socket.id, "Socket connected");

            socket.on("join-room", async |socket: SocketRef, Data::<String>(room)| {
                tracing::debug!(sid = %socket.id, %room, "Socket joined room");
                socket.join(room);
            });

            socket.on("leave-room", async |socket: SocketRef, Data::<String>(room)| {
                socket.leave(room);
            });

            socket.on_disconnect(async |socket: SocketRef| {
                tracing::debug!(sid = %socket.id, "Socket disconnected");
            });
        });

        (layer, Self { io })
    }

    /// Push a task comment to everyone in the admin room. Delivery is best
    /// effort, a failed emit only logs.
    pub async fn broadcast_task_comment(&self, payload: &TaskCommentPayload) {
        if let Err(e) = self
            .io
            .to(ADMIN_ROOM)
            .emit(TASK_COMMENT_EVENT, payload)
            .await
        {
            tracing::warn!(error = %e, "Failed to broadcast task comment");
        }
    }
}
