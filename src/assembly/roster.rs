use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    Iterable, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::assembly::non_blank;
use crate::entities::delegation::{self, DelegateType, Quota};
use crate::entities::enrollment;
use crate::util::cpf;

/// Elected seats available to each state.
pub const MAX_ELECTED_PER_STATE: usize = 30;

impl DelegateType {
    pub fn label(self) -> &'static str {
        match self {
            DelegateType::Eleito => "Eleito(a)",
            DelegateType::Nato => "Nato(a)",
            DelegateType::Suplente => "Suplente",
        }
    }
}

impl Quota {
    pub fn label(self) -> &'static str {
        match self {
            Quota::AmplaConcorrencia => "Ampla concorrência",
            Quota::Mulheres => "Mulheres",
            Quota::PessoasNegras => "Pessoas negras",
            Quota::PovosIndigenas => "Povos indígenas",
            Quota::PovosTradicionais => "Povos e comunidades tradicionais",
            Quota::Pcd => "Pessoas com deficiência",
            Quota::Lgbtqiapn => "LGBTQIAPN+",
            Quota::Juventude => "Juventude",
            Quota::PessoaIdosa => "Pessoas idosas",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterViolation {
    #[error("Preencha o campo {0}")]
    MissingField(&'static str),

    #[error("CPF inválido")]
    InvalidCpf,

    #[error("Já existe uma pessoa com este CPF na delegação")]
    DuplicateCpf,

    #[error("A delegação de {state} já tem {max} pessoas eleitas", max = MAX_ELECTED_PER_STATE)]
    ElectedCapReached { state: String },

    #[error("Escolha a pessoa eleita que este(a) suplente substitui")]
    AlternateNeedsElected,

    #[error("Suplentes só podem substituir pessoas eleitas da mesma delegação")]
    AlternateTargetInvalid,

    #[error("Esta pessoa eleita já tem suplente")]
    AlternateAlreadyAssigned,

    #[error("Remova o(a) suplente vinculado(a) antes de mudar o tipo desta pessoa")]
    HasAlternate,
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error(transparent)]
    Violation(#[from] RosterViolation),

    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Raw roster form as posted by the page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DelegateForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub mother_name: String,
    #[serde(default)]
    pub state: String,
    pub quota: Option<Quota>,
    pub delegate_type: Option<DelegateType>,
    #[serde(default)]
    pub substitutes_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateInput {
    pub full_name: String,
    pub cpf: String,
    pub mother_name: String,
    pub state: String,
    pub quota: Quota,
    pub delegate_type: DelegateType,
    pub substitutes_id: Option<i32>,
}

impl DelegateForm {
    /// Normalises the form for the roster of `state`.
    pub fn parse(self, state: String) -> Result<DelegateInput, RosterViolation> {
        let full_name = non_blank(&self.full_name).ok_or(RosterViolation::MissingField("nome"))?;
        let mother_name =
            non_blank(&self.mother_name).ok_or(RosterViolation::MissingField("nome da mãe"))?;
        if self.cpf.trim().is_empty() {
            return Err(RosterViolation::MissingField("CPF"));
        }
        if !cpf::is_valid(&self.cpf) {
            return Err(RosterViolation::InvalidCpf);
        }
        let quota = self.quota.ok_or(RosterViolation::MissingField("cota"))?;
        let delegate_type = self
            .delegate_type
            .ok_or(RosterViolation::MissingField("tipo"))?;

        let substitutes_id = match delegate_type {
            DelegateType::Suplente => Some(
                self.substitutes_id
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| RosterViolation::AlternateNeedsElected)?,
            ),
            _ => None,
        };

        Ok(DelegateInput {
            full_name,
            cpf: cpf::digits(&self.cpf),
            mother_name,
            state,
            quota,
            delegate_type,
            substitutes_id,
        })
    }
}

impl From<&delegation::Model> for DelegateForm {
    fn from(model: &delegation::Model) -> Self {
        Self {
            full_name: model.full_name.clone(),
            cpf: cpf::format(&model.cpf),
            mother_name: model.mother_name.clone(),
            state: model.state.clone(),
            quota: Some(model.quota),
            delegate_type: Some(model.delegate_type),
            substitutes_id: model
                .substitutes_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Checks `input` against the current roster of its state. `editing` is the
/// id of the entry being replaced, which is left out of every count.
pub fn check_entry(
    roster: &[delegation::Model],
    input: &DelegateInput,
    editing: Option<i32>,
) -> Result<(), RosterViolation> {
    let others: Vec<&delegation::Model> =
        roster.iter().filter(|d| Some(d.id) != editing).collect();

    if others.iter().any(|d| d.cpf == input.cpf) {
        return Err(RosterViolation::DuplicateCpf);
    }

    if let Some(id) = editing {
        let has_alternate = others.iter().any(|d| d.substitutes_id == Some(id));
        if has_alternate && input.delegate_type != DelegateType::Eleito {
            return Err(RosterViolation::HasAlternate);
        }
    }

    match input.delegate_type {
        DelegateType::Eleito => {
            let elected = others
                .iter()
                .filter(|d| d.delegate_type == DelegateType::Eleito)
                .count();
            if elected >= MAX_ELECTED_PER_STATE {
                return Err(RosterViolation::ElectedCapReached {
                    state: input.state.clone(),
                });
            }
        }
        DelegateType::Suplente => {
            let target_id = input
                .substitutes_id
                .ok_or(RosterViolation::AlternateNeedsElected)?;
            let target = others
                .iter()
                .find(|d| d.id == target_id)
                .ok_or(RosterViolation::AlternateTargetInvalid)?;
            if target.delegate_type != DelegateType::Eleito || target.state != input.state {
                return Err(RosterViolation::AlternateTargetInvalid);
            }
            if others.iter().any(|d| d.substitutes_id == Some(target_id)) {
                return Err(RosterViolation::AlternateAlreadyAssigned);
            }
        }
        DelegateType::Nato => {}
    }

    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    #[serde(flatten)]
    pub delegation: delegation::Model,
    pub cpf_display: String,
    pub type_label: &'static str,
    pub quota_label: &'static str,
    /// Set when an enrollment exists or the entry was marked complete.
    pub complete: bool,
    pub substitutes_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaCount {
    pub quota: Quota,
    pub label: &'static str,
    pub elected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterSummary {
    pub elected: usize,
    pub ex_officio: usize,
    pub alternates: usize,
    pub complete: usize,
    pub seats_left: usize,
    pub by_quota: Vec<QuotaCount>,
}

pub fn build_entries(roster: &[delegation::Model], enrolled: &HashSet<i32>) -> Vec<RosterEntry> {
    roster
        .iter()
        .map(|d| RosterEntry {
            delegation: d.clone(),
            cpf_display: cpf::format(&d.cpf),
            type_label: d.delegate_type.label(),
            quota_label: d.quota.label(),
            complete: d.completed || enrolled.contains(&d.id),
            substitutes_name: d.substitutes_id.and_then(|sid| {
                roster
                    .iter()
                    .find(|other| other.id == sid)
                    .map(|other| other.full_name.clone())
            }),
        })
        .collect()
}

pub fn summarize(entries: &[RosterEntry]) -> RosterSummary {
    let count = |t: DelegateType| {
        entries
            .iter()
            .filter(|e| e.delegation.delegate_type == t)
            .count()
    };
    let elected = count(DelegateType::Eleito);

    let by_quota = Quota::iter()
        .map(|quota| QuotaCount {
            quota,
            label: quota.label(),
            elected: entries
                .iter()
                .filter(|e| {
                    e.delegation.delegate_type == DelegateType::Eleito
                        && e.delegation.quota == quota
                })
                .count(),
        })
        .collect();

    RosterSummary {
        elected,
        ex_officio: count(DelegateType::Nato),
        alternates: count(DelegateType::Suplente),
        complete: entries.iter().filter(|e| e.complete).count(),
        seats_left: MAX_ELECTED_PER_STATE.saturating_sub(elected),
        by_quota,
    }
}

pub async fn state_roster(
    db: &DatabaseConnection,
    state: &str,
) -> Result<Vec<delegation::Model>, DbErr> {
    delegation::Entity::find()
        .filter(delegation::Column::State.eq(state))
        .order_by_asc(delegation::Column::DelegateType)
        .order_by_asc(delegation::Column::FullName)
        .all(db)
        .await
}

pub async fn full_roster(db: &DatabaseConnection) -> Result<Vec<delegation::Model>, DbErr> {
    delegation::Entity::find()
        .order_by_asc(delegation::Column::State)
        .order_by_asc(delegation::Column::DelegateType)
        .order_by_asc(delegation::Column::FullName)
        .all(db)
        .await
}

/// Ids among `roster` that already have an enrollment.
pub async fn enrolled_ids(
    db: &DatabaseConnection,
    roster: &[delegation::Model],
) -> Result<HashSet<i32>, DbErr> {
    if roster.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<i32> = roster.iter().map(|d| d.id).collect();
    Ok(enrollment::Entity::find()
        .filter(enrollment::Column::DelegationId.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|e| e.delegation_id)
        .collect())
}

pub async fn add_delegate(
    db: &DatabaseConnection,
    input: DelegateInput,
    created_by: i32,
) -> Result<delegation::Model, RosterError> {
    let roster = state_roster(db, &input.state).await?;
    check_entry(&roster, &input, None)?;

    let now = chrono::Utc::now().naive_utc();
    let model = delegation::ActiveModel {
        full_name: Set(input.full_name),
        cpf: Set(input.cpf),
        mother_name: Set(input.mother_name),
        state: Set(input.state),
        quota: Set(input.quota),
        delegate_type: Set(input.delegate_type),
        completed: Set(false),
        substitutes_id: Set(input.substitutes_id),
        created_by: Set(Some(created_by)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Added {:?} delegate {} to {}",
        model.delegate_type, model.id, model.state
    );
    Ok(model)
}

pub async fn update_delegate(
    db: &DatabaseConnection,
    existing: delegation::Model,
    input: DelegateInput,
) -> Result<delegation::Model, RosterError> {
    let roster = state_roster(db, &input.state).await?;
    check_entry(&roster, &input, Some(existing.id))?;

    let mut model = existing.into_active_model();
    model.full_name = Set(input.full_name);
    model.cpf = Set(input.cpf);
    model.mother_name = Set(input.mother_name);
    model.quota = Set(input.quota);
    model.delegate_type = Set(input.delegate_type);
    model.substitutes_id = Set(input.substitutes_id);
    model.updated_at = Set(chrono::Utc::now().naive_utc());
    let model = model.update(db).await?;

    info!("Updated delegate {}", model.id);
    Ok(model)
}

pub async fn set_completed(
    db: &DatabaseConnection,
    existing: delegation::Model,
    completed: bool,
) -> Result<delegation::Model, DbErr> {
    let mut model = existing.into_active_model();
    model.completed = Set(completed);
    model.updated_at = Set(chrono::Utc::now().naive_utc());
    model.update(db).await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    pub(crate) fn delegate(id: i32, cpf: &str, delegate_type: DelegateType) -> delegation::Model {
        let now = chrono::Utc::now().naive_utc();
        delegation::Model {
            id,
            full_name: format!("Pessoa {id}"),
            cpf: cpf.to_string(),
            mother_name: format!("Mãe {id}"),
            state: "BA".to_string(),
            quota: Quota::AmplaConcorrencia,
            delegate_type,
            completed: false,
            substitutes_id: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn elected_roster(n: i32) -> Vec<delegation::Model> {
        (1..=n)
            .map(|i| delegate(i, &format!("{:011}", i), DelegateType::Eleito))
            .collect()
    }

    fn input(delegate_type: DelegateType, substitutes_id: Option<i32>) -> DelegateInput {
        DelegateInput {
            full_name: "Nova Pessoa".to_string(),
            cpf: "52998224725".to_string(),
            mother_name: "Maria".to_string(),
            state: "BA".to_string(),
            quota: Quota::Mulheres,
            delegate_type,
            substitutes_id,
        }
    }

    #[test]
    fn thirty_first_elected_is_rejected() {
        let roster = elected_roster(29);
        assert_eq!(check_entry(&roster, &input(DelegateType::Eleito, None), None), Ok(()));

        let roster = elected_roster(30);
        assert_eq!(
            check_entry(&roster, &input(DelegateType::Eleito, None), None),
            Err(RosterViolation::ElectedCapReached {
                state: "BA".to_string()
            })
        );
    }

    #[test]
    fn cap_does_not_apply_to_ex_officio_or_edits() {
        let roster = elected_roster(30);
        assert_eq!(check_entry(&roster, &input(DelegateType::Nato, None), None), Ok(()));

        let mut edit = input(DelegateType::Eleito, None);
        edit.cpf = roster[4].cpf.clone();
        assert_eq!(check_entry(&roster, &edit, Some(roster[4].id)), Ok(()));
    }

    #[test]
    fn duplicate_cpf_is_rejected() {
        let roster = vec![delegate(1, "52998224725", DelegateType::Nato)];
        assert_eq!(
            check_entry(&roster, &input(DelegateType::Nato, None), None),
            Err(RosterViolation::DuplicateCpf)
        );
    }

    #[test]
    fn alternates_need_a_free_elected_target() {
        let mut roster = vec![
            delegate(1, "11144477735", DelegateType::Eleito),
            delegate(2, "00000000191", DelegateType::Nato),
        ];
        assert_eq!(check_entry(&roster, &input(DelegateType::Suplente, Some(1)), None), Ok(()));
        assert_eq!(
            check_entry(&roster, &input(DelegateType::Suplente, Some(2)), None),
            Err(RosterViolation::AlternateTargetInvalid)
        );
        assert_eq!(
            check_entry(&roster, &input(DelegateType::Suplente, Some(99)), None),
            Err(RosterViolation::AlternateTargetInvalid)
        );

        let mut existing_alternate = delegate(3, "39053344705", DelegateType::Suplente);
        existing_alternate.substitutes_id = Some(1);
        roster.push(existing_alternate);
        assert_eq!(
            check_entry(&roster, &input(DelegateType::Suplente, Some(1)), None),
            Err(RosterViolation::AlternateAlreadyAssigned)
        );
    }

    #[test]
    fn elected_with_alternate_cannot_change_type() {
        let mut alternate = delegate(2, "39053344705", DelegateType::Suplente);
        alternate.substitutes_id = Some(1);
        let roster = vec![delegate(1, "11144477735", DelegateType::Eleito), alternate];

        let mut edit = input(DelegateType::Nato, None);
        edit.cpf = "11144477735".to_string();
        assert_eq!(
            check_entry(&roster, &edit, Some(1)),
            Err(RosterViolation::HasAlternate)
        );
    }

    #[test]
    fn form_parsing_normalises_and_validates() {
        let form = DelegateForm {
            full_name: "  Ana Souza ".to_string(),
            cpf: "529.982.247-25".to_string(),
            mother_name: "Joana Souza".to_string(),
            state: String::new(),
            quota: Some(Quota::Mulheres),
            delegate_type: Some(DelegateType::Eleito),
            substitutes_id: "4".to_string(),
        };
        let parsed = form.clone().parse("BA".to_string()).unwrap();
        assert_eq!(parsed.full_name, "Ana Souza");
        assert_eq!(parsed.cpf, "52998224725");
        assert_eq!(parsed.substitutes_id, None);

        let bad_cpf = DelegateForm {
            cpf: "123.456.789-00".to_string(),
            ..form.clone()
        };
        assert_eq!(bad_cpf.parse("BA".into()), Err(RosterViolation::InvalidCpf));

        let alternate_without_target = DelegateForm {
            delegate_type: Some(DelegateType::Suplente),
            substitutes_id: String::new(),
            ..form
        };
        assert_eq!(
            alternate_without_target.parse("BA".into()),
            Err(RosterViolation::AlternateNeedsElected)
        );
    }

    #[test]
    fn completion_is_derived_from_enrollments() {
        let mut done = delegate(2, "39053344705", DelegateType::Nato);
        done.completed = true;
        let roster = vec![
            delegate(1, "11144477735", DelegateType::Eleito),
            done,
            delegate(3, "52998224725", DelegateType::Eleito),
        ];
        let enrolled: HashSet<i32> = [3].into_iter().collect();

        let entries = build_entries(&roster, &enrolled);
        let complete: Vec<bool> = entries.iter().map(|e| e.complete).collect();
        assert_eq!(complete, vec![false, true, true]);

        let summary = summarize(&entries);
        assert_eq!(summary.elected, 2);
        assert_eq!(summary.ex_officio, 1);
        assert_eq!(summary.complete, 2);
        assert_eq!(summary.seats_left, MAX_ELECTED_PER_STATE - 2);
        let ampla = summary
            .by_quota
            .iter()
            .find(|q| q.quota == Quota::AmplaConcorrencia)
            .unwrap();
        assert_eq!(ampla.elected, 2);
    }

    #[tokio::test]
    async fn add_delegate_blocks_the_31st_elected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([elected_roster(30)])
            .into_connection();

        let result = add_delegate(&db, input(DelegateType::Eleito, None), 1).await;
        assert!(matches!(
            result,
            Err(RosterError::Violation(RosterViolation::ElectedCapReached { .. }))
        ));
    }

    #[tokio::test]
    async fn add_delegate_inserts_when_allowed() {
        let mut stored = delegate(31, "52998224725", DelegateType::Eleito);
        stored.quota = Quota::Mulheres;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([elected_roster(3)])
            .append_query_results([vec![stored.clone()]])
            .into_connection();

        let model = add_delegate(&db, input(DelegateType::Eleito, None), 1)
            .await
            .unwrap();
        assert_eq!(model, stored);
    }
}
