use axum_login::tower_sessions::Session;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

const FLASH_KEY: &str = "ui.flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

pub async fn success(session: &Session, message: impl Into<String>) -> AppResult<()> {
    push(session, FlashLevel::Success, message.into()).await
}

pub async fn error(session: &Session, message: impl Into<String>) -> AppResult<()> {
    push(session, FlashLevel::Error, message.into()).await
}

async fn push(session: &Session, level: FlashLevel, message: String) -> AppResult<()> {
    session.insert(FLASH_KEY, Flash { level, message }).await?;
    Ok(())
}

pub async fn take(session: &Session) -> AppResult<Option<Flash>> {
    Ok(session.remove::<Flash>(FLASH_KEY).await?)
}
