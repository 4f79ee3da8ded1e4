use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::ws::connections::RoomSnapshot;
use axum::{
    extract::{Path, State},
    Json,
};
use debate_signal_protocol::DebateId;

pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSnapshot>> {
    Json(state.connections.room_snapshots().await)
}

pub async fn get_room(
    State(state): State<AppState>,
    Path(debate_id): Path<String>,
) -> Result<Json<RoomSnapshot>> {
    let not_found = || AppError::NotFound(format!("Debate room {debate_id} not found"));
    let id = DebateId::new(debate_id.as_str()).map_err(|_| not_found())?;

    state
        .connections
        .room_snapshot(&id)
        .await
        .map(Json)
        .ok_or_else(not_found)
}
