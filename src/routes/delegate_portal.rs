use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_login::tower_sessions::Session;
use minijinja::context;
use sea_orm::EntityTrait;
use tracing::{debug, info};

use crate::{
    assembly::{
        deadline::{self, DeadlineStatus},
        enrollment::{self, EnrollmentForm, SHIRT_SIZES},
        identity::{self, IdentifiedDelegate, IdentityClaim},
    },
    auth::user::AuthSession,
    entities::delegation,
    error::AppResult,
    router::AppState,
    routes::render_page,
    util::{flash, states::UFS},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/acesso", get(access_form).post(identify))
        .route("/inscricao", get(enrollment_form).post(submit_enrollment))
        .route("/sair", post(leave))
}

pub async fn access_form(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
) -> AppResult<Response> {
    if identity::current(&session).await?.is_some() {
        return Ok(Redirect::to("/delegado/inscricao").into_response());
    }
    let page = render_page(
        &state,
        &auth_session,
        &session,
        "delegate_access.html",
        context! {},
    )
    .await?;
    Ok(page.into_response())
}

pub async fn identify(
    State(state): State<AppState>,
    session: Session,
    Form(claim): Form<IdentityClaim>,
) -> AppResult<Response> {
    match identity::identify(&*state.db, &claim).await? {
        Some(row) => {
            identity::remember(&session, &row).await?;
            info!("Delegate {} identified", row.id);
            Ok(Redirect::to("/delegado/inscricao").into_response())
        }
        None => {
            debug!("Identity check failed");
            flash::error(
                &session,
                "Não encontramos uma inscrição com esses dados. Confira nome, CPF e nome da mãe.",
            )
            .await?;
            Ok(Redirect::to("/delegado/acesso").into_response())
        }
    }
}

/// The identified delegate and their roster row, or a redirect to the access page.
async fn identified(
    state: &AppState,
    session: &Session,
) -> AppResult<Result<(IdentifiedDelegate, delegation::Model), Response>> {
    let back = || Redirect::to("/delegado/acesso").into_response();
    let Some(who) = identity::current(session).await? else {
        return Ok(Err(back()));
    };
    match delegation::Entity::find_by_id(who.delegation_id)
        .one(&*state.db)
        .await?
    {
        Some(row) => Ok(Ok((who, row))),
        None => {
            // Removed from the roster since identifying.
            identity::forget(session).await?;
            Ok(Err(back()))
        }
    }
}

async fn current_deadline(state: &AppState) -> AppResult<DeadlineStatus> {
    Ok(deadline::current_status(
        &*state.db,
        state.config.registration_offset_days,
        state.today(),
    )
    .await?)
}

async fn render_enrollment(
    state: &AppState,
    auth_session: &AuthSession,
    session: &Session,
    who: IdentifiedDelegate,
    form: EnrollmentForm,
    errors: Vec<String>,
    already_saved: bool,
) -> AppResult<Response> {
    let deadline = current_deadline(state).await?;
    let page = render_page(
        state,
        auth_session,
        session,
        "enrollment_form.html",
        context! {
            delegate => who,
            form => form,
            errors => errors,
            already_saved => already_saved,
            closed => deadline.is_closed(),
            deadline_message => deadline.message(),
            ufs => UFS,
            shirt_sizes => SHIRT_SIZES,
        },
    )
    .await?;
    Ok(page.into_response())
}

pub async fn enrollment_form(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
) -> AppResult<Response> {
    let (who, row) = match identified(&state, &session).await? {
        Ok(found) => found,
        Err(redirect) => return Ok(redirect),
    };
    let existing = enrollment::find_for_delegation(&*state.db, row.id).await?;
    let already_saved = existing.is_some();
    let form = existing
        .as_ref()
        .map(EnrollmentForm::from)
        .unwrap_or_default();

    render_enrollment(&state, &auth_session, &session, who, form, vec![], already_saved).await
}

pub async fn submit_enrollment(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Form(form): Form<EnrollmentForm>,
) -> AppResult<Response> {
    let (who, row) = match identified(&state, &session).await? {
        Ok(found) => found,
        Err(redirect) => return Ok(redirect),
    };

    let locked = deadline::changes_locked(
        &*state.db,
        state.config.registration_offset_days,
        state.today(),
        None,
    )
    .await?;
    if locked {
        flash::error(&session, "O prazo de inscrições já terminou").await?;
        return Ok(Redirect::to("/delegado/inscricao").into_response());
    }

    let valid = match form.check(state.today()) {
        Ok(valid) => valid,
        Err(errors) => {
            let already_saved = enrollment::find_for_delegation(&*state.db, row.id)
                .await?
                .is_some();
            return render_enrollment(
                &state,
                &auth_session,
                &session,
                who,
                form,
                errors,
                already_saved,
            )
            .await;
        }
    };

    enrollment::save(&*state.db, row.id, form, valid).await?;
    flash::success(&session, "Inscrição salva. Obrigado!").await?;
    Ok(Redirect::to("/delegado/inscricao").into_response())
}

pub async fn leave(session: Session) -> AppResult<Response> {
    identity::forget(&session).await?;
    Ok(Redirect::to("/").into_response())
}
