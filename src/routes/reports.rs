use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_login::tower_sessions::Session;
use minijinja::context;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use tracing::info;

use crate::{
    assembly::{
        non_blank,
        reports::{self, Document, NewReport},
    },
    auth::{
        access::{ensure_state_access, require, scoped_state},
        user::AuthSession,
    },
    entities::{state_report, user::Role},
    error::{AppError, AppResult},
    router::AppState,
    routes::render_page,
    util::{flash, states::UFS},
};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    estado: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reports).post(upload_report))
        .route("/{id}/excluir", post(delete_report))
}

#[derive(Debug, Default)]
struct ReportUpload {
    title: String,
    description: String,
    state: String,
    document_url: String,
    file: Option<(String, Vec<u8>)>,
}

async fn read_upload(mut multipart: Multipart) -> AppResult<ReportUpload> {
    let mut upload = ReportUpload::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was picked.
                if !bytes.is_empty() {
                    upload.file = Some((file_name, bytes.to_vec()));
                }
            }
            "title" => upload.title = field.text().await?,
            "description" => upload.description = field.text().await?,
            "state" => upload.state = field.text().await?,
            "document_url" => upload.document_url = field.text().await?,
            _ => {}
        }
    }
    Ok(upload)
}

pub async fn list_reports(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Query(query): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    let user = require(&auth_session, Role::can_upload_reports)?;
    let selected = scoped_state(&user, query.estado.as_deref())?;

    let mut find = state_report::Entity::find();
    if let Some(uf) = &selected {
        find = find.filter(state_report::Column::State.eq(uf.clone()));
    }
    let reports = find
        .order_by_desc(state_report::Column::CreatedAt)
        .all(&*state.db)
        .await?;

    render_page(
        &state,
        &auth_session,
        &session,
        "reports.html",
        context! {
            active => "relatorios",
            reports => reports,
            selected_state => selected,
            can_pick_state => user.role.can_view_all_states(),
            ufs => UFS,
        },
    )
    .await
}

pub async fn upload_report(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    multipart: Multipart,
) -> AppResult<Response> {
    let user = require(&auth_session, Role::can_upload_reports)?;
    let upload = read_upload(multipart).await?;

    let Some(uf) = scoped_state(&user, Some(&upload.state))? else {
        flash::error(&session, "Escolha o estado do relatório").await?;
        return Ok(Redirect::to("/relatorios").into_response());
    };
    let back = Redirect::to(&format!("/relatorios?estado={uf}")).into_response();

    let Some(title) = non_blank(&upload.title) else {
        flash::error(&session, "Informe o título do relatório").await?;
        return Ok(back);
    };

    let document = match (upload.file, non_blank(&upload.document_url)) {
        (Some((file_name, bytes)), _) => Document::Upload { file_name, bytes },
        (None, Some(url)) if url.starts_with("https://") || url.starts_with("http://") => {
            Document::Link(url)
        }
        (None, Some(_)) => {
            flash::error(&session, "O link do documento deve começar com http(s)://").await?;
            return Ok(back);
        }
        (None, None) => {
            flash::error(&session, "Envie um arquivo ou informe o link do documento").await?;
            return Ok(back);
        }
    };

    let report = reports::record(
        &*state.db,
        &state.storage,
        NewReport {
            state: uf.clone(),
            title,
            description: upload.description.trim().to_string(),
            document,
            uploaded_by: user.id,
        },
    )
    .await?;

    info!("User {} uploaded report {} for {}", user.id, report.id, uf);
    flash::success(&session, "Relatório enviado").await?;
    Ok(back)
}

pub async fn delete_report(
    State(state): State<AppState>,
    auth_session: AuthSession,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    let user = require(&auth_session, Role::can_upload_reports)?;
    let report = state_report::Entity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_state_access(&user, &report.state)?;

    let uf = report.state.clone();
    reports::remove(&*state.db, &state.storage, report).await?;

    info!("User {} deleted report {}", user.id, id);
    flash::success(&session, "Relatório excluído").await?;
    Ok(Redirect::to(&format!("/relatorios?estado={uf}")).into_response())
}
