//! Conversation history handlers.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use chathub_database::repositories::message::MessageStore;
use chathub_entity::message::Message;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/messages/{user_a}/{user_b}
///
/// The full conversation between the two users, both directions,
/// ascending by creation time. Reads straight from the message store;
/// completely decoupled from the live-connection path.
pub async fn conversation_history(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((user_a, user_b)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    let messages = state.message_repo.history(user_a, user_b).await?;

    Ok(Json(ApiResponse::ok(messages)))
}
