use std::collections::BTreeMap;

use axum::{extract::State, response::IntoResponse};
use axum_login::tower_sessions::Session;
use minijinja::context;
use serde::Serialize;

use crate::{
    assembly::{calendar, deadline, roster},
    auth::{access::require_user, user::AuthSession},
    error::AppResult,
    router::AppState,
    routes::render_page,
};

#[derive(Debug, Serialize)]
struct StateRow {
    state: String,
    summary: roster::RosterSummary,
}

pub async fn dashboard(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
) -> AppResult<impl IntoResponse> {
    let user = require_user(&auth_session)?;
    let today = state.today();

    let deadline =
        deadline::current_status(&*state.db, state.config.registration_offset_days, today).await?;
    let mut upcoming = calendar::upcoming(&*state.db, today).await?;
    upcoming.truncate(5);

    let mut own_summary = None;
    let mut state_rows = Vec::new();
    if user.role.can_view_all_states() {
        let all = roster::full_roster(&*state.db).await?;
        let enrolled = roster::enrolled_ids(&*state.db, &all).await?;
        let mut by_state: BTreeMap<String, Vec<_>> = BTreeMap::new();
        for d in all {
            by_state.entry(d.state.clone()).or_default().push(d);
        }
        for (uf, rows) in by_state {
            let entries = roster::build_entries(&rows, &enrolled);
            state_rows.push(StateRow {
                state: uf,
                summary: roster::summarize(&entries),
            });
        }
    } else if let (true, Some(uf)) = (user.role.can_manage_roster(), user.state.as_deref()) {
        let rows = roster::state_roster(&*state.db, uf).await?;
        let enrolled = roster::enrolled_ids(&*state.db, &rows).await?;
        own_summary = Some(roster::summarize(&roster::build_entries(&rows, &enrolled)));
    }

    render_page(
        &state,
        &auth_session,
        &session,
        "dashboard.html",
        context! {
            active => "painel",
            deadline => deadline,
            deadline_message => deadline.message(),
            upcoming => upcoming,
            own_summary => own_summary,
            state_rows => state_rows,
            max_elected => roster::MAX_ELECTED_PER_STATE,
        },
    )
    .await
}
