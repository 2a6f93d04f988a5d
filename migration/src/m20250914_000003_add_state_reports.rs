use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = table_auto(StateReport::Table)
            .col(pk_auto(StateReport::Id))
            .col(string_len(StateReport::State, 2))
            .col(string(StateReport::Title))
            .col(text(StateReport::Description).default(""))
            .col(string(StateReport::DocumentUrl))
            .col(integer_null(StateReport::UploadedBy))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_state_report_uploader")
                    .from(StateReport::Table, StateReport::UploadedBy)
                    .to(AppUser::Table, AppUser::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            )
            .to_owned();
        manager.create_table(table).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StateReport::Table).to_owned())
            .await?;

        Ok(())
    }
}
