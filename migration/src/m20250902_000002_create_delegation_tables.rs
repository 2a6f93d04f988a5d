use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = table_auto(Delegation::Table)
            .col(pk_auto(Delegation::Id))
            .col(string(Delegation::FullName))
            .col(string_len(Delegation::Cpf, 11))
            .col(string(Delegation::MotherName))
            .col(string_len(Delegation::State, 2))
            .col(string_len(Delegation::Quota, 32))
            .col(string_len(Delegation::DelegateType, 16))
            .col(boolean(Delegation::Completed).default(false))
            .col(integer_null(Delegation::SubstitutesId))
            .col(integer_null(Delegation::CreatedBy))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_delegation_substitutes")
                    .from(Delegation::Table, Delegation::SubstitutesId)
                    .to(Delegation::Table, Delegation::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_delegation_created_by")
                    .from(Delegation::Table, Delegation::CreatedBy)
                    .to(AppUser::Table, AppUser::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            )
            .to_owned();
        manager.create_table(table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_delegation_state")
                    .table(Delegation::Table)
                    .col(Delegation::State)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_delegation_cpf")
                    .table(Delegation::Table)
                    .col(Delegation::Cpf)
                    .to_owned(),
            )
            .await?;

        let table = table_auto(Enrollment::Table)
            .col(pk_auto(Enrollment::Id))
            .col(integer_uniq(Enrollment::DelegationId))
            .col(string_null(Enrollment::SocialName))
            .col(date(Enrollment::BirthDate))
            .col(string(Enrollment::GenderIdentity))
            .col(string_null(Enrollment::SexualOrientation))
            .col(string(Enrollment::RaceColor))
            .col(boolean(Enrollment::IsPcd).default(false))
            .col(string_null(Enrollment::PcdDescription))
            .col(string(Enrollment::Rg))
            .col(string(Enrollment::RgIssuer))
            .col(string(Enrollment::Email))
            .col(string(Enrollment::Phone))
            .col(string_null(Enrollment::Whatsapp))
            .col(string_len(Enrollment::Cep, 8))
            .col(string(Enrollment::Street))
            .col(string(Enrollment::AddressNumber))
            .col(string_null(Enrollment::Complement))
            .col(string(Enrollment::Neighborhood))
            .col(string(Enrollment::City))
            .col(string_len(Enrollment::AddressState, 2))
            .col(string(Enrollment::CulturalOrganization))
            .col(string(Enrollment::CulturalSegment))
            .col(string_null(Enrollment::RoleInOrganization))
            .col(integer(Enrollment::YearsActive).default(0))
            .col(text_null(Enrollment::AccessibilityNeeds))
            .col(string_null(Enrollment::DietaryRestriction))
            .col(string_len(Enrollment::ShirtSize, 4))
            .col(boolean(Enrollment::NeedsLodging).default(false))
            .col(boolean(Enrollment::NeedsTransport).default(false))
            .col(string_null(Enrollment::DepartureCity))
            .col(string(Enrollment::EmergencyContactName))
            .col(string(Enrollment::EmergencyContactPhone))
            .col(boolean(Enrollment::ConsentDataUse))
            .col(boolean(Enrollment::ConsentImageUse))
            .col(boolean(Enrollment::ConsentCodeOfConduct))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_enrollment_delegation")
                    .from(Enrollment::Table, Enrollment::DelegationId)
                    .to(Delegation::Table, Delegation::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned();
        manager.create_table(table).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Enrollment::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Delegation::Table).to_owned())
            .await?;

        Ok(())
    }
}
