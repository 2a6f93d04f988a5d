use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_login::tower_sessions::Session;
use minijinja::context;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, EntityTrait, Iterable, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::{
    assembly::validation_messages,
    auth::{access::require, password, user::AuthSession},
    entities::user::{self, Role},
    error::{AppError, AppResult},
    router::AppState,
    routes::render_page,
    util::{flash, states::{UFS, normalize_uf}},
};

#[derive(Debug, Deserialize, Validate)]
pub struct NewUserForm {
    #[validate(email(message = "Informe um e-mail válido"))]
    pub email: String,
    #[validate(length(min = 1, message = "Informe o nome"))]
    pub name: String,
    #[validate(length(min = 8, message = "A senha deve ter ao menos 8 caracteres"))]
    pub password: String,
    /// Kept as text so a missing or unknown profile becomes a message, not a 422.
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub state: String,
}

impl NewUserForm {
    fn parsed_role(&self) -> Result<Role, String> {
        let raw = self.role.trim();
        Role::iter()
            .find(|r| r.to_value() == raw)
            .ok_or_else(|| "Escolha o perfil".to_string())
    }

    /// Representatives need a state; other roles ignore it.
    fn resolved_state(&self, role: Role) -> Result<Option<String>, String> {
        match (role, normalize_uf(&self.state)) {
            (Role::Representante, None) => {
                Err("Representações estaduais precisam de um estado".to_string())
            }
            (_, state) => Ok(state),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}/excluir", post(delete_user))
}

pub async fn list_users(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
) -> AppResult<impl IntoResponse> {
    require(&auth_session, Role::can_manage_users)?;
    let users = user::Entity::find()
        .order_by_asc(user::Column::Name)
        .all(&*state.db)
        .await?;
    let roles: Vec<_> = Role::iter().map(|r| (r, r.label())).collect();

    render_page(
        &state,
        &auth_session,
        &session,
        "users.html",
        context! {
            active => "usuarios",
            users => users,
            roles => roles,
            ufs => UFS,
        },
    )
    .await
}

pub async fn create_user(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Form(form): Form<NewUserForm>,
) -> AppResult<Response> {
    let admin = require(&auth_session, Role::can_manage_users)?;
    let back = Redirect::to("/usuarios").into_response();

    if let Err(errors) = form.validate() {
        flash::error(&session, validation_messages(&errors).join(". ")).await?;
        return Ok(back);
    }
    let role = match form.parsed_role() {
        Ok(role) => role,
        Err(message) => {
            flash::error(&session, message).await?;
            return Ok(back);
        }
    };
    let user_state = match form.resolved_state(role) {
        Ok(s) => s,
        Err(message) => {
            flash::error(&session, message).await?;
            return Ok(back);
        }
    };

    let email = form.email.trim().to_lowercase();
    let taken = user::Entity::find()
        .filter(user::Column::Email.eq(email.clone()))
        .one(&*state.db)
        .await?
        .is_some();
    if taken {
        flash::error(&session, "Já existe um usuário com este e-mail").await?;
        return Ok(back);
    }

    let password_hash = password::hash(form.password).await?;
    let now = chrono::Utc::now().naive_utc();
    let created = user::ActiveModel {
        email: Set(email),
        password_hash: Set(password_hash),
        name: Set(form.name.trim().to_string()),
        role: Set(role),
        state: Set(user_state),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*state.db)
    .await?;

    info!("Admin {} created user {} ({:?})", admin.id, created.id, role);
    flash::success(&session, "Usuário criado").await?;
    Ok(back)
}

pub async fn delete_user(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    let admin = require(&auth_session, Role::can_manage_users)?;
    if admin.id == id {
        flash::error(&session, "Você não pode excluir o próprio usuário").await?;
        return Ok(Redirect::to("/usuarios").into_response());
    }

    let target = user::Entity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or(AppError::NotFound)?;
    target.delete(&*state.db).await?;

    info!("Admin {} deleted user {}", admin.id, id);
    flash::success(&session, "Usuário excluído").await?;
    Ok(Redirect::to("/usuarios").into_response())
}
