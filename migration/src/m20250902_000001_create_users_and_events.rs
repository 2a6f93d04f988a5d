use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = table_auto(AppUser::Table)
            .col(pk_auto(AppUser::Id))
            .col(string_uniq(AppUser::Email))
            .col(string(AppUser::PasswordHash))
            .col(string(AppUser::Name))
            .col(string_len(AppUser::Role, 32))
            .col(string_len_null(AppUser::State, 2))
            .to_owned();
        manager.create_table(table).await?;

        let table = table_auto(Event::Table)
            .col(pk_auto(Event::Id))
            .col(string_len(Event::Kind, 16))
            .col(string(Event::Title))
            .col(date(Event::StartDate))
            .col(date(Event::EndDate))
            .col(string(Event::Location))
            .col(text(Event::Theme).default(""))
            .col(integer(Event::EstimatedAttendance).default(0))
            .col(string_len_null(Event::State, 2))
            .col(integer_null(Event::OwnerId))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_event_owner")
                    .from(Event::Table, Event::OwnerId)
                    .to(AppUser::Table, AppUser::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            )
            .check(Expr::col(Event::EndDate).gte(Expr::col(Event::StartDate)))
            .to_owned();
        manager.create_table(table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_start_date")
                    .table(Event::Table)
                    .col(Event::StartDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Event::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AppUser::Table).to_owned())
            .await?;

        Ok(())
    }
}
