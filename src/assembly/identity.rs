use axum_login::tower_sessions::Session;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::entities::delegation;
use crate::error::AppResult;
use crate::util::cpf;

const DELEGATE_SESSION_KEY: &str = "delegate.identity";

/// What a delegate types in place of a login.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IdentityClaim {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub mother_name: String,
}

/// Continuation state for a delegate that passed the identity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedDelegate {
    pub delegation_id: i32,
    pub full_name: String,
    pub state: String,
}

/// Case-folds and collapses whitespace so "  ANA  souza" matches "Ana Souza".
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl IdentityClaim {
    pub fn is_complete(&self) -> bool {
        !self.full_name.trim().is_empty()
            && !self.mother_name.trim().is_empty()
            && !cpf::digits(&self.cpf).is_empty()
    }

    pub fn matches(&self, row: &delegation::Model) -> bool {
        cpf::digits(&self.cpf) == row.cpf
            && normalize_name(&self.full_name) == normalize_name(&row.full_name)
            && normalize_name(&self.mother_name) == normalize_name(&row.mother_name)
    }
}

/// Finds the roster entry matching all three fields.
pub async fn identify(
    db: &DatabaseConnection,
    claim: &IdentityClaim,
) -> Result<Option<delegation::Model>, DbErr> {
    if !claim.is_complete() {
        return Ok(None);
    }
    let candidates = delegation::Entity::find()
        .filter(delegation::Column::Cpf.eq(cpf::digits(&claim.cpf)))
        .all(db)
        .await?;
    Ok(candidates.into_iter().find(|row| claim.matches(row)))
}

pub async fn remember(session: &Session, row: &delegation::Model) -> AppResult<()> {
    // New identity, new session id.
    session.cycle_id().await?;
    session
        .insert(
            DELEGATE_SESSION_KEY,
            IdentifiedDelegate {
                delegation_id: row.id,
                full_name: row.full_name.clone(),
                state: row.state.clone(),
            },
        )
        .await?;
    Ok(())
}

pub async fn current(session: &Session) -> AppResult<Option<IdentifiedDelegate>> {
    Ok(session.get::<IdentifiedDelegate>(DELEGATE_SESSION_KEY).await?)
}

pub async fn forget(session: &Session) -> AppResult<()> {
    session.remove::<IdentifiedDelegate>(DELEGATE_SESSION_KEY).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::roster::tests::delegate;
    use crate::entities::delegation::DelegateType;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn claim(name: &str, cpf: &str, mother: &str) -> IdentityClaim {
        IdentityClaim {
            full_name: name.to_string(),
            cpf: cpf.to_string(),
            mother_name: mother.to_string(),
        }
    }

    #[test]
    fn names_compare_loosely_on_case_and_spacing() {
        assert_eq!(normalize_name("  ANA   maria\tSouza "), "ana maria souza");
    }

    #[test]
    fn all_three_fields_must_match() {
        let row = delegate(1, "52998224725", DelegateType::Eleito);
        assert!(claim("pessoa 1", "529.982.247-25", "MÃE 1").matches(&row));
        assert!(!claim("Pessoa 2", "529.982.247-25", "Mãe 1").matches(&row));
        assert!(!claim("Pessoa 1", "111.444.777-35", "Mãe 1").matches(&row));
        assert!(!claim("Pessoa 1", "529.982.247-25", "Outra").matches(&row));
    }

    #[tokio::test]
    async fn identify_returns_matching_row() {
        let row = delegate(4, "52998224725", DelegateType::Nato);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row.clone()]])
            .into_connection();

        let found = identify(&db, &claim("Pessoa 4", "52998224725", "Mãe 4"))
            .await
            .unwrap();
        assert_eq!(found, Some(row));
    }

    #[tokio::test]
    async fn incomplete_claims_skip_the_lookup() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let found = identify(&db, &claim("Pessoa", "", "Mãe")).await.unwrap();
        assert!(found.is_none());
    }
}
