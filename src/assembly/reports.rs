use sea_orm::{ActiveModelTrait, DatabaseConnection, ModelTrait, Set};
use tracing::{info, warn};

use crate::entities::state_report;
use crate::error::AppResult;
use crate::storage::FileStorage;

pub const BUCKET: &str = "reports";

/// Where a report's document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Upload { file_name: String, bytes: Vec<u8> },
    Link(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    pub state: String,
    pub title: String,
    pub description: String,
    pub document: Document,
    pub uploaded_by: i32,
}

/// Stores the document and inserts the report row. A stored file is removed
/// again when the insert fails.
pub async fn record(
    db: &DatabaseConnection,
    storage: &FileStorage,
    report: NewReport,
) -> AppResult<state_report::Model> {
    let document_url = match report.document {
        Document::Upload { file_name, bytes } => storage.put(BUCKET, &file_name, &bytes).await?,
        Document::Link(url) => url,
    };

    let now = chrono::Utc::now().naive_utc();
    let inserted = state_report::ActiveModel {
        state: Set(report.state),
        title: Set(report.title),
        description: Set(report.description),
        document_url: Set(document_url.clone()),
        uploaded_by: Set(Some(report.uploaded_by)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(model) => {
            info!("Recorded report {} for {}", model.id, model.state);
            Ok(model)
        }
        Err(e) => {
            if let Err(io) = storage.delete_url(&document_url).await {
                warn!("Could not remove {} after failed insert: {}", document_url, io);
            }
            Err(e.into())
        }
    }
}

/// Deletes the row first, then its stored file.
pub async fn remove(
    db: &DatabaseConnection,
    storage: &FileStorage,
    report: state_report::Model,
) -> AppResult<()> {
    let url = report.document_url.clone();
    report.delete(db).await?;
    if let Err(e) = storage.delete_url(&url).await {
        warn!("Report row deleted but {} remains on disk: {}", url, e);
    }
    Ok(())
}
