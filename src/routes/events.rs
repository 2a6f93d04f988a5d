use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_login::tower_sessions::Session;
use minijinja::context;
use sea_orm::{EntityTrait, ModelTrait};
use tracing::info;

use crate::{
    assembly::calendar::{self, EventForm},
    auth::{
        access::{require, require_user},
        user::AuthSession,
    },
    entities::{event, user::Role},
    error::{AppError, AppResult},
    router::AppState,
    routes::render_page,
    util::{flash, states::UFS},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/novo", get(new_event))
        .route("/{id}", post(update_event))
        .route("/{id}/editar", get(edit_event))
        .route("/{id}/excluir", post(delete_event))
}

async fn find_event(state: &AppState, id: i32) -> AppResult<event::Model> {
    event::Entity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn list_events(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
) -> AppResult<impl IntoResponse> {
    let user = require_user(&auth_session)?;
    let today = state.today();
    let upcoming = calendar::upcoming(&*state.db, today).await?;
    let past = calendar::past(&*state.db, today, 10).await?;

    let editable: Vec<i32> = upcoming
        .iter()
        .chain(past.iter())
        .filter(|e| calendar::can_edit(&user, e))
        .map(|e| e.id)
        .collect();

    render_page(
        &state,
        &auth_session,
        &session,
        "events.html",
        context! {
            active => "eventos",
            upcoming => upcoming,
            past => past,
            editable => editable,
            can_create => user.role.can_manage_events(),
        },
    )
    .await
}

async fn render_form(
    state: &AppState,
    auth_session: &AuthSession,
    session: &Session,
    event_id: Option<i32>,
    form: EventForm,
    errors: Vec<String>,
) -> AppResult<Response> {
    let is_admin = auth_session.user.as_ref().is_some_and(|u| u.role.is_admin());
    let page = render_page(
        state,
        auth_session,
        session,
        "event_form.html",
        context! {
            active => "eventos",
            event_id => event_id,
            form => form,
            errors => errors,
            is_admin => is_admin,
            ufs => UFS,
        },
    )
    .await?;
    Ok(page.into_response())
}

pub async fn new_event(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
) -> AppResult<Response> {
    require(&auth_session, Role::can_manage_events)?;
    render_form(&state, &auth_session, &session, None, EventForm::default(), vec![]).await
}

pub async fn create_event(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Form(form): Form<EventForm>,
) -> AppResult<Response> {
    let user = require(&auth_session, Role::can_manage_events)?;
    let input = match form.parse(&user) {
        Ok(input) => input,
        Err(errors) => {
            return render_form(&state, &auth_session, &session, None, form, errors).await;
        }
    };

    calendar::create(&*state.db, input, &user).await?;
    flash::success(&session, "Evento cadastrado").await?;
    Ok(Redirect::to("/eventos").into_response())
}

pub async fn edit_event(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    let user = require(&auth_session, Role::can_manage_events)?;
    let event = find_event(&state, id).await?;
    if !calendar::can_edit(&user, &event) {
        return Err(AppError::Forbidden);
    }
    render_form(
        &state,
        &auth_session,
        &session,
        Some(id),
        EventForm::from(&event),
        vec![],
    )
    .await
}

pub async fn update_event(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<EventForm>,
) -> AppResult<Response> {
    let user = require(&auth_session, Role::can_manage_events)?;
    let event = find_event(&state, id).await?;
    if !calendar::can_edit(&user, &event) {
        return Err(AppError::Forbidden);
    }
    let input = match form.parse(&user) {
        Ok(input) => input,
        Err(errors) => {
            return render_form(&state, &auth_session, &session, Some(id), form, errors).await;
        }
    };

    calendar::update(&*state.db, event, input).await?;
    info!("User {} updated event {}", user.id, id);
    flash::success(&session, "Evento atualizado").await?;
    Ok(Redirect::to("/eventos").into_response())
}

pub async fn delete_event(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    let user = require(&auth_session, Role::can_manage_events)?;
    let event = find_event(&state, id).await?;
    if !calendar::can_edit(&user, &event) {
        return Err(AppError::Forbidden);
    }

    event.delete(&*state.db).await?;
    info!("User {} deleted event {}", user.id, id);
    flash::success(&session, "Evento excluído").await?;
    Ok(Redirect::to("/eventos").into_response())
}
