use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_login::tower_sessions::Session;
use minijinja::context;
use sea_orm::{EntityTrait, Iterable, ModelTrait};
use serde::Deserialize;
use tracing::info;

use crate::{
    assembly::{
        deadline,
        enrollment::{self, EnrollmentForm},
        roster::{self, DelegateForm, RosterError},
    },
    auth::{
        access::{ensure_state_access, require, scoped_state},
        user::AuthSession,
    },
    entities::{
        delegation::{self, DelegateType, Quota},
        user::{self, Role},
    },
    error::{AppError, AppResult},
    router::AppState,
    routes::render_page,
    util::{flash, states::UFS},
};

#[derive(Debug, Deserialize)]
pub struct RosterQuery {
    estado: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roster).post(add_delegate))
        .route("/{id}", post(update_delegate))
        .route("/{id}/editar", get(edit_delegate))
        .route("/{id}/excluir", post(delete_delegate))
        .route("/{id}/concluida", post(toggle_completed))
        .route("/{id}/inscricao", get(view_enrollment))
}

fn roster_url(state: &str) -> String {
    format!("/delegacoes?estado={state}")
}

/// Representatives stop editing once registration closes.
async fn roster_locked(state: &AppState, user: &user::Model) -> AppResult<bool> {
    Ok(deadline::changes_locked(
        &*state.db,
        state.config.registration_offset_days,
        state.today(),
        Some(user.role),
    )
    .await?)
}

async fn find_delegation(
    state: &AppState,
    user: &user::Model,
    id: i32,
) -> AppResult<delegation::Model> {
    let row = delegation::Entity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_state_access(user, &row.state)?;
    Ok(row)
}

/// Elected delegates of a roster, offered as targets for alternates.
fn elected_options(rows: &[delegation::Model]) -> Vec<(i32, String)> {
    rows.iter()
        .filter(|d| d.delegate_type == DelegateType::Eleito)
        .map(|d| (d.id, d.full_name.clone()))
        .collect()
}

fn quota_options() -> Vec<(Quota, &'static str)> {
    Quota::iter().map(|q| (q, q.label())).collect()
}

fn type_options() -> Vec<(DelegateType, &'static str)> {
    DelegateType::iter().map(|t| (t, t.label())).collect()
}

pub async fn list_roster(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Query(query): Query<RosterQuery>,
) -> AppResult<impl IntoResponse> {
    let user = require(&auth_session, Role::can_manage_roster)?;
    let selected = scoped_state(&user, query.estado.as_deref())?;

    let (entries, summary, elected) = match &selected {
        Some(uf) => {
            let rows = roster::state_roster(&*state.db, uf).await?;
            let enrolled = roster::enrolled_ids(&*state.db, &rows).await?;
            let entries = roster::build_entries(&rows, &enrolled);
            let summary = roster::summarize(&entries);
            (entries, Some(summary), elected_options(&rows))
        }
        None => (Vec::new(), None, Vec::new()),
    };

    let locked = roster_locked(&state, &user).await?;

    render_page(
        &state,
        &auth_session,
        &session,
        "delegations.html",
        context! {
            active => "delegacoes",
            selected_state => selected,
            can_pick_state => user.role.can_view_all_states(),
            can_toggle => user.role.is_admin(),
            ufs => UFS,
            entries => entries,
            summary => summary,
            elected => elected,
            quotas => quota_options(),
            types => type_options(),
            locked => locked,
            max_elected => roster::MAX_ELECTED_PER_STATE,
        },
    )
    .await
}

pub async fn add_delegate(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Form(form): Form<DelegateForm>,
) -> AppResult<Response> {
    let user = require(&auth_session, Role::can_manage_roster)?;
    let Some(uf) = scoped_state(&user, Some(&form.state))? else {
        flash::error(&session, "Escolha o estado da delegação").await?;
        return Ok(Redirect::to("/delegacoes").into_response());
    };
    if roster_locked(&state, &user).await? {
        flash::error(&session, "O prazo de inscrições já terminou").await?;
        return Ok(Redirect::to(&roster_url(&uf)).into_response());
    }

    let result = match form.parse(uf.clone()) {
        Ok(input) => roster::add_delegate(&*state.db, input, user.id).await,
        Err(violation) => Err(violation.into()),
    };
    match result {
        Ok(_) => flash::success(&session, "Pessoa adicionada à delegação").await?,
        Err(RosterError::Violation(v)) => flash::error(&session, v.to_string()).await?,
        Err(RosterError::Database(e)) => return Err(e.into()),
    }
    Ok(Redirect::to(&roster_url(&uf)).into_response())
}

pub async fn edit_delegate(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    let user = require(&auth_session, Role::can_manage_roster)?;
    let row = find_delegation(&state, &user, id).await?;
    let rows = roster::state_roster(&*state.db, &row.state).await?;
    let elected: Vec<_> = elected_options(&rows)
        .into_iter()
        .filter(|(eid, _)| *eid != id)
        .collect();

    let page = render_page(
        &state,
        &auth_session,
        &session,
        "delegation_form.html",
        context! {
            active => "delegacoes",
            delegation_id => id,
            selected_state => row.state,
            form => DelegateForm::from(&row),
            elected => elected,
            quotas => quota_options(),
            types => type_options(),
        },
    )
    .await?;
    Ok(page.into_response())
}

pub async fn update_delegate(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<DelegateForm>,
) -> AppResult<Response> {
    let user = require(&auth_session, Role::can_manage_roster)?;
    let row = find_delegation(&state, &user, id).await?;
    let uf = row.state.clone();
    if roster_locked(&state, &user).await? {
        flash::error(&session, "O prazo de inscrições já terminou").await?;
        return Ok(Redirect::to(&roster_url(&uf)).into_response());
    }

    let result = match form.parse(uf.clone()) {
        Ok(input) => roster::update_delegate(&*state.db, row, input).await,
        Err(violation) => Err(violation.into()),
    };
    match result {
        Ok(_) => {
            flash::success(&session, "Dados atualizados").await?;
            Ok(Redirect::to(&roster_url(&uf)).into_response())
        }
        Err(RosterError::Violation(v)) => {
            flash::error(&session, v.to_string()).await?;
            Ok(Redirect::to(&format!("/delegacoes/{id}/editar")).into_response())
        }
        Err(RosterError::Database(e)) => Err(e.into()),
    }
}

pub async fn delete_delegate(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    let user = require(&auth_session, Role::can_manage_roster)?;
    let row = find_delegation(&state, &user, id).await?;
    let uf = row.state.clone();
    if roster_locked(&state, &user).await? {
        flash::error(&session, "O prazo de inscrições já terminou").await?;
        return Ok(Redirect::to(&roster_url(&uf)).into_response());
    }

    // Alternates pointing here are detached by the foreign key.
    row.delete(&*state.db).await?;
    info!("User {} removed delegate {} from {}", user.id, id, uf);
    flash::success(&session, "Pessoa removida da delegação").await?;
    Ok(Redirect::to(&roster_url(&uf)).into_response())
}

pub async fn toggle_completed(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    let user = require(&auth_session, Role::is_admin)?;
    let row = find_delegation(&state, &user, id).await?;
    let uf = row.state.clone();
    let completed = !row.completed;

    roster::set_completed(&*state.db, row, completed).await?;
    info!("User {} set delegate {} completed={}", user.id, id, completed);
    flash::success(&session, "Situação atualizada").await?;
    Ok(Redirect::to(&roster_url(&uf)).into_response())
}

pub async fn view_enrollment(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    let user = require(&auth_session, Role::can_manage_roster)?;
    let row = find_delegation(&state, &user, id).await?;
    let Some(record) = enrollment::find_for_delegation(&*state.db, id).await? else {
        flash::error(&session, "Esta pessoa ainda não preencheu a inscrição").await?;
        return Ok(Redirect::to(&roster_url(&row.state)).into_response());
    };

    let form = EnrollmentForm::from(&record);
    let page = render_page(
        &state,
        &auth_session,
        &session,
        "enrollment_view.html",
        context! {
            active => "delegacoes",
            delegation => row,
            enrollment => record,
            form => form,
        },
    )
    .await?;
    Ok(page.into_response())
}
