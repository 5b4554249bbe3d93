//! HTTP API endpoints.
//!
//! Public endpoints expose the roster and draw state; admin endpoints mutate
//! the roster and are mounted behind the Basic Auth middleware.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::DrawError;
use crate::state::export::{export_filename, parse_roster_text};
use crate::state::AppState;
use crate::types::{Participant, ParticipantId, ParticipantRecord, SquadLabel, Snapshot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Participant>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<Participant>,
}

impl ActionResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            participants: None,
            participant: None,
        }
    }

    fn with_participants(mut self, participants: Vec<Participant>) -> Self {
        self.participants = Some(participants);
        self
    }

    fn with_participant(mut self, participant: Participant) -> Self {
        self.participant = Some(participant);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Error wrapper that renders as a JSON body with the matching status
#[derive(Debug)]
pub struct ApiError(pub DrawError);

impl From<DrawError> for ApiError {
    fn from(err: DrawError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!("API request failed: {}", self.0);
        let body = ErrorResponse {
            error: self.0.to_string(),
            code: self.0.code().to_string(),
        };
        (self.0.status(), Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PossibleSquadsResponse {
    pub possible_counts: Vec<usize>,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub append: bool,
}

#[derive(Debug, Deserialize)]
pub struct RosterImport {
    pub records: Vec<ParticipantRecord>,
    #[serde(default)]
    pub append: bool,
}

#[derive(Debug, Deserialize)]
pub struct RedistributeRequest {
    pub squad_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSquadRequest {
    pub participant_id: ParticipantId,
    pub new_squad: String,
}

/// GET /api/participants
pub async fn list_participants(State(state): State<Arc<AppState>>) -> Json<Vec<Participant>> {
    Json(state.get_participants().await)
}

/// GET /api/used-squads
pub async fn list_used_squads(State(state): State<Arc<AppState>>) -> Json<Vec<SquadLabel>> {
    Json(state.used_squads().await)
}

/// GET /api/possible-squads
pub async fn possible_squads(State(state): State<Arc<AppState>>) -> Json<PossibleSquadsResponse> {
    Json(PossibleSquadsResponse {
        possible_counts: state.possible_squad_counts().await,
    })
}

/// GET /api/snapshot
pub async fn snapshot(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.snapshot().await)
}

async fn import_records(
    state: &AppState,
    records: &[ParticipantRecord],
    append: bool,
) -> ApiResult<ActionResponse> {
    if append {
        let (added, participants) = state.append_roster(records).await?;
        Ok(ActionResponse::ok(format!(
            "Added {} participants (total: {})",
            added,
            participants.len()
        ))
        .with_participants(participants))
    } else {
        let participants = state.replace_roster(records).await?;
        Ok(
            ActionResponse::ok(format!("Loaded {} participants", participants.len()))
                .with_participants(participants),
        )
    }
}

/// POST /api/admin/upload?append=bool
///
/// Body is the raw roster file (`;`, `,` or tab separated).
pub async fn upload_roster(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    body: String,
) -> ApiResult<Json<ActionResponse>> {
    let records = parse_roster_text(&body);
    tracing::info!(
        "Roster upload: {} valid records, append={}",
        records.len(),
        query.append
    );
    if records.is_empty() {
        return Err(DrawError::validation("File contains no valid participant records").into());
    }
    Ok(Json(import_records(&state, &records, query.append).await?))
}

/// POST /api/admin/roster
pub async fn import_roster(
    State(state): State<Arc<AppState>>,
    Json(import): Json<RosterImport>,
) -> ApiResult<Json<ActionResponse>> {
    tracing::info!(
        "Roster import: {} records, append={}",
        import.records.len(),
        import.append
    );
    Ok(Json(
        import_records(&state, &import.records, import.append).await?,
    ))
}

/// POST /api/admin/redistribute
pub async fn redistribute(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RedistributeRequest>,
) -> ApiResult<Json<ActionResponse>> {
    let participants = state.redistribute_squads(req.squad_count).await?;
    Ok(Json(
        ActionResponse::ok(format!(
            "Participants redistributed into {} squads",
            req.squad_count
        ))
        .with_participants(participants),
    ))
}

/// POST /api/admin/participants
pub async fn add_participant(
    State(state): State<Arc<AppState>>,
    Json(record): Json<ParticipantRecord>,
) -> ApiResult<Json<ActionResponse>> {
    let participant = state.add_participant(&record).await?;
    tracing::info!("Added participant {}", participant.id);
    Ok(Json(
        ActionResponse::ok("Participant added").with_participant(participant),
    ))
}

/// POST /api/admin/participants/squad
pub async fn update_participant_squad(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateSquadRequest>,
) -> ApiResult<Json<ActionResponse>> {
    let participant = state
        .update_participant_squad(req.participant_id, &req.new_squad)
        .await?;
    Ok(Json(
        ActionResponse::ok("Participant squad updated").with_participant(participant),
    ))
}

/// DELETE /api/admin/participants/{id}
pub async fn remove_participant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ParticipantId>,
) -> ApiResult<Json<ActionResponse>> {
    let participants = state.remove_participant(id).await?;
    tracing::info!("Removed participant {}", id);
    Ok(Json(
        ActionResponse::ok("Participant removed").with_participants(participants),
    ))
}

/// POST /api/admin/reset
pub async fn reset(State(state): State<Arc<AppState>>) -> Json<ActionResponse> {
    state.reset_draw().await;
    Json(ActionResponse::ok("Used squads reset"))
}

/// GET /api/admin/export
///
/// Downloads the roster as `participants-export-YYYY-MM-DD.csv`.
pub async fn export_roster(State(state): State<Arc<AppState>>) -> Response {
    let body = state.export_roster().await;
    let filename = export_filename(chrono::Local::now().date_naive());
    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "text/csv; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}
