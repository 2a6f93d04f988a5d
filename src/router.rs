use crate::{
    auth::{
        router as auth_router,
        user::{AuthSession, Backend},
    },
    config::Config,
    error::AppResult,
    routes::{api, dashboard, delegations, delegate_portal, events, reports, users},
    storage::{FileStorage, PUBLIC_PREFIX},
    util::asset_loader::AssetLoader,
};
use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, get_service},
};
use axum_login::{
    AuthManagerLayerBuilder, login_required,
    tower_sessions::{
        Expiry, Session, SessionManagerLayer,
        cookie::{SameSite, time},
    },
};
use minijinja::{Environment, Value};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::{signal, task::AbortHandle};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions_sqlx_store::PostgresStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub templates: Arc<Environment<'static>>,
    pub storage: FileStorage,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn render(&self, name: &str, ctx: Value) -> AppResult<Html<String>> {
        let tmpl = self.templates.get_template(name)?;
        Ok(Html(tmpl.render(ctx)?))
    }

    pub fn today(&self) -> chrono::NaiveDate {
        chrono::Local::now().date_naive()
    }
}

pub fn create_router(
    db: DatabaseConnection,
    config: Config,
    storage: FileStorage,
    session_store: PostgresStore,
) -> Router {
    let db = Arc::new(db);
    let state = AppState {
        db: db.clone(),
        templates: Arc::new(setup_templates()),
        storage: storage.clone(),
        config: Arc::new(config.clone()),
    };

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.session_secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(1)));

    // Auth service.
    //
    // This combines the session layer with our backend to establish the auth
    // service which will provide the auth session as a request extension.
    let backend = Backend::new(db);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let protected = Router::new()
        .route("/painel", get(dashboard::dashboard))
        .nest("/eventos", events::routes())
        .nest("/delegacoes", delegations::routes())
        .nest(
            "/relatorios",
            reports::routes().layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .nest("/usuarios", users::routes())
        .nest("/api", api::routes())
        .route_layer(login_required!(Backend, login_url = "/login"));

    Router::new()
        .merge(protected)
        .nest("/delegado", delegate_portal::routes())
        .route("/", get(index))
        .merge(auth_router::router())
        .with_state(state)
        .nest_service("/static", get_service(ServeDir::new("static")))
        .nest_service(PUBLIC_PREFIX, get_service(ServeDir::new(storage.root())))
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http())
}

fn setup_templates() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(minijinja::path_loader("templates"));
    let asset_loader = AssetLoader::new("static");
    asset_loader.register(&mut env);
    env
}

async fn index(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
) -> AppResult<Response> {
    if auth_session.user.is_some() {
        return Ok(Redirect::to("/painel").into_response());
    }
    let page =
        crate::routes::render_page(&state, &auth_session, &session, "index.html", minijinja::context! {})
            .await?;
    Ok(page.into_response())
}

pub async fn shutdown_signal(deletion_task_abort_handle: AbortHandle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { deletion_task_abort_handle.abort() },
        _ = terminate => { deletion_task_abort_handle.abort() },
    }
}
