pub mod api;
pub mod dashboard;
pub mod delegate_portal;
pub mod delegations;
pub mod events;
pub mod reports;
pub mod users;

use axum::response::Html;
use axum_login::tower_sessions::Session;
use minijinja::{Value, context};

use crate::{
    auth::{access::nav_items, user::AuthSession},
    error::AppResult,
    router::AppState,
    util::flash,
};

/// Renders `template` with the chrome every page needs: current user,
/// role-gated navigation and the pending flash message.
pub async fn render_page(
    state: &AppState,
    auth_session: &AuthSession,
    session: &Session,
    template: &str,
    ctx: Value,
) -> AppResult<Html<String>> {
    let flash = flash::take(session).await?;
    let user = auth_session.user.as_ref();
    let nav = user.map(|u| nav_items(u.role)).unwrap_or_default();

    state.render(
        template,
        context! {
            current_user => user,
            role_label => user.map(|u| u.role.label()),
            nav => nav,
            flash => flash,
            ..ctx
        },
    )
}
