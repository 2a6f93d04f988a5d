use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_login::tower_sessions::Session;
use minijinja::context;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use tracing::{info, warn};

use super::user::{AuthSession, Credentials};
use crate::{error::AppResult, router::AppState, routes::render_page, util::flash};

// This allows us to extract the "next" field from the query string. We use this
// to redirect after log in.
#[derive(Debug, Deserialize)]
pub struct NextUrl {
    next: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(self::post::login))
        .route("/login", get(self::get::login))
        .route("/logout", get(self::get::logout))
}

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

mod post {
    use super::*;

    pub async fn login(
        mut auth_session: AuthSession,
        session: Session,
        Form(creds): Form<Credentials>,
    ) -> AppResult<Response> {
        let next = creds.next.clone();
        let user = match auth_session.authenticate(creds).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                flash::error(&session, "E-mail ou senha incorretos").await?;
                let target = match safe_next(next.as_deref()) {
                    Some(next) => format!(
                        "/login?next={}",
                        utf8_percent_encode(next, NON_ALPHANUMERIC)
                    ),
                    None => "/login".to_string(),
                };
                return Ok(Redirect::to(&target).into_response());
            }
            Err(e) => {
                warn!("Authentication backend failed: {e}");
                flash::error(&session, "Não foi possível entrar agora, tente novamente").await?;
                return Ok(Redirect::to("/login").into_response());
            }
        };

        if let Err(e) = auth_session.login(&user).await {
            warn!("Failed to start session for user {}: {e}", user.id);
            flash::error(&session, "Não foi possível iniciar a sessão").await?;
            return Ok(Redirect::to("/login").into_response());
        }
        info!("User {} logged in", user.id);

        let target = safe_next(next.as_deref()).unwrap_or("/painel");
        Ok(Redirect::to(target).into_response())
    }
}

mod get {
    use super::*;

    pub async fn login(
        State(state): State<AppState>,
        auth_session: AuthSession,
        session: Session,
        Query(NextUrl { next }): Query<NextUrl>,
    ) -> AppResult<Response> {
        if auth_session.user.is_some() {
            return Ok(Redirect::to("/painel").into_response());
        }
        let page = render_page(
            &state,
            &auth_session,
            &session,
            "login.html",
            context! { next => safe_next(next.as_deref()) },
        )
        .await?;
        Ok(page.into_response())
    }

    pub async fn logout(mut auth_session: AuthSession) -> AppResult<Response> {
        match auth_session.logout().await {
            Ok(Some(user)) => info!("User {} logged out", user.id),
            Ok(None) => {}
            Err(e) => warn!("Logout failed: {e}"),
        }
        Ok(Redirect::to("/login").into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_be_a_local_path() {
        assert_eq!(safe_next(Some("/delegacoes?estado=BA")), Some("/delegacoes?estado=BA"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil")), None);
        assert_eq!(safe_next(None), None);
    }
}
