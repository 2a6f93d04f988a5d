use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait, Set, sqlx::PgPool};
use tracing::info;

use crate::auth::password;
use crate::config::BootstrapAdmin;
use crate::entities::{prelude::User, user};

pub async fn setup_database(db_url: &str) -> anyhow::Result<(DatabaseConnection, PgPool)> {
    let db = Database::connect(db_url).await?;
    Migrator::up(&db, None).await?;

    let pool = PgPool::connect(db_url).await?;

    Ok((db, pool))
}

/// Creates the first general administrator when the user table is empty.
pub async fn seed_admin(db: &DatabaseConnection, admin: &BootstrapAdmin) -> anyhow::Result<()> {
    if User::find().count(db).await? > 0 {
        return Ok(());
    }

    let password_hash = password::hash(admin.password.clone()).await?;
    let now = chrono::Utc::now().naive_utc();
    user::ActiveModel {
        email: Set(admin.email.trim().to_lowercase()),
        password_hash: Set(password_hash),
        name: Set("Administração Geral".to_string()),
        role: Set(user::Role::AdminGeral),
        state: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Seeded bootstrap admin {}", admin.email);
    Ok(())
}
