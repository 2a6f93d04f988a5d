pub use sea_orm_migration::prelude::*;

mod iden;
mod m20250902_000001_create_users_and_events;
mod m20250902_000002_create_delegation_tables;
mod m20250914_000003_add_state_reports;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250902_000001_create_users_and_events::Migration),
            Box::new(m20250902_000002_create_delegation_tables::Migration),
            Box::new(m20250914_000003_add_state_reports::Migration),
        ]
    }
}
