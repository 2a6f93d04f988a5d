use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{
    assembly::{
        deadline::{self, DeadlineStatus},
        roster::{self, RosterEntry, RosterSummary},
    },
    auth::{
        access::{require, require_user, scoped_state},
        user::AuthSession,
    },
    entities::user::Role,
    error::AppResult,
    router::AppState,
};

#[derive(Deserialize)]
pub struct RosterQuery {
    pub state: Option<String>,
}

#[derive(Serialize)]
pub struct RosterResponse {
    pub state: Option<String>,
    pub summary: RosterSummary,
    pub delegates: Vec<RosterEntry>,
}

#[derive(Serialize)]
pub struct DeadlineResponse {
    #[serde(flatten)]
    pub status: DeadlineStatus,
    pub message: String,
    pub offset_days: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/delegacoes", get(api_roster))
        .route("/prazo", get(api_deadline))
}

/// Roster with derived completion status. Admins without `state` get every state.
pub async fn api_roster(
    State(state): State<AppState>,
    auth_session: AuthSession,
    Query(query): Query<RosterQuery>,
) -> AppResult<Json<RosterResponse>> {
    let user = require(&auth_session, Role::can_manage_roster)?;
    let selected = scoped_state(&user, query.state.as_deref())?;

    let rows = match &selected {
        Some(uf) => roster::state_roster(&*state.db, uf).await?,
        None => roster::full_roster(&*state.db).await?,
    };
    let enrolled = roster::enrolled_ids(&*state.db, &rows).await?;
    let delegates = roster::build_entries(&rows, &enrolled);

    Ok(Json(RosterResponse {
        state: selected,
        summary: roster::summarize(&delegates),
        delegates,
    }))
}

pub async fn api_deadline(
    State(state): State<AppState>,
    auth_session: AuthSession,
) -> AppResult<Json<DeadlineResponse>> {
    require_user(&auth_session)?;
    let offset_days = state.config.registration_offset_days;
    let status = deadline::current_status(&*state.db, offset_days, state.today()).await?;

    Ok(Json(DeadlineResponse {
        message: status.message(),
        status,
        offset_days,
    }))
}
