use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::assembly::{non_blank, validation_messages};
use crate::entities::{delegation, enrollment};
use crate::error::{AppError, AppResult};
use crate::util::states::normalize_uf;

pub const SHIRT_SIZES: [&str; 7] = ["PP", "P", "M", "G", "GG", "XG", "XXG"];

/// The enrollment page as posted. Checkboxes arrive as `Some("on")` or not at all.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct EnrollmentForm {
    #[serde(default)]
    pub social_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Informe a data de nascimento"))]
    pub birth_date: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Informe a identidade de gênero"))]
    pub gender_identity: String,
    #[serde(default)]
    pub sexual_orientation: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Informe raça/cor"))]
    pub race_color: String,
    pub is_pcd: Option<String>,
    #[serde(default)]
    pub pcd_description: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Informe o RG"))]
    pub rg: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Informe o órgão emissor do RG"))]
    pub rg_issuer: String,

    #[serde(default)]
    #[validate(email(message = "Informe um e-mail válido"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "Informe um telefone com DDD"))]
    pub phone: String,
    #[serde(default)]
    pub whatsapp: String,

    #[serde(default)]
    pub cep: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Informe o logradouro"))]
    pub street: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Informe o número do endereço"))]
    pub address_number: String,
    #[serde(default)]
    pub complement: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Informe o bairro"))]
    pub neighborhood: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Informe a cidade"))]
    pub city: String,
    #[serde(default)]
    pub address_state: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Informe o Ponto ou coletivo de cultura"))]
    pub cultural_organization: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Informe o segmento cultural"))]
    pub cultural_segment: String,
    #[serde(default)]
    pub role_in_organization: String,
    #[serde(default)]
    pub years_active: String,

    #[serde(default)]
    pub accessibility_needs: String,
    #[serde(default)]
    pub dietary_restriction: String,
    #[serde(default)]
    pub shirt_size: String,
    pub needs_lodging: Option<String>,
    pub needs_transport: Option<String>,
    #[serde(default)]
    pub departure_city: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Informe um contato de emergência"))]
    pub emergency_contact_name: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "Informe o telefone do contato de emergência"))]
    pub emergency_contact_phone: String,

    #[validate(required(message = "É preciso autorizar o uso dos dados pessoais"))]
    pub consent_data_use: Option<String>,
    #[validate(required(message = "É preciso autorizar o uso de imagem"))]
    pub consent_image_use: Option<String>,
    #[validate(required(message = "É preciso aceitar o código de conduta"))]
    pub consent_code_of_conduct: Option<String>,
}

/// A form that passed every check, with typed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEnrollment {
    pub birth_date: NaiveDate,
    pub cep: String,
    pub address_state: String,
    pub years_active: i32,
    pub shirt_size: String,
}

fn checked(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

fn checkbox(value: bool) -> Option<String> {
    value.then(|| "on".to_string())
}

impl EnrollmentForm {
    pub fn check(&self, today: NaiveDate) -> Result<ValidEnrollment, Vec<String>> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => validation_messages(&e),
        };

        let birth_date = match NaiveDate::parse_from_str(self.birth_date.trim(), "%Y-%m-%d") {
            Ok(d) if d < today => Some(d),
            Ok(_) => {
                errors.push("Data de nascimento no futuro".to_string());
                None
            }
            Err(_) if self.birth_date.trim().is_empty() => None,
            Err(_) => {
                errors.push("Data de nascimento inválida".to_string());
                None
            }
        };

        let cep: String = self.cep.chars().filter(char::is_ascii_digit).collect();
        if cep.len() != 8 {
            errors.push("CEP deve ter 8 dígitos".to_string());
        }

        let address_state = normalize_uf(&self.address_state);
        if address_state.is_none() {
            errors.push("Escolha o estado do endereço".to_string());
        }

        let years_active = match self.years_active.trim() {
            "" => Some(0),
            raw => match raw.parse::<i32>() {
                Ok(y) if (0..=100).contains(&y) => Some(y),
                _ => {
                    errors.push("Tempo de atuação inválido".to_string());
                    None
                }
            },
        };

        let shirt_size = self.shirt_size.trim().to_ascii_uppercase();
        if !SHIRT_SIZES.contains(&shirt_size.as_str()) {
            errors.push("Escolha o tamanho da camiseta".to_string());
        }

        if checked(&self.is_pcd) && self.pcd_description.trim().is_empty() {
            errors.push("Descreva a deficiência para planejarmos a acessibilidade".to_string());
        }

        match (birth_date, address_state, years_active) {
            (Some(birth_date), Some(address_state), Some(years_active)) if errors.is_empty() => {
                Ok(ValidEnrollment {
                    birth_date,
                    cep,
                    address_state,
                    years_active,
                    shirt_size,
                })
            }
            _ => Err(errors),
        }
    }

    fn apply(self, valid: ValidEnrollment, model: &mut enrollment::ActiveModel) {
        model.social_name = Set(non_blank(&self.social_name));
        model.birth_date = Set(valid.birth_date);
        model.gender_identity = Set(self.gender_identity.trim().to_string());
        model.sexual_orientation = Set(non_blank(&self.sexual_orientation));
        model.race_color = Set(self.race_color.trim().to_string());
        model.is_pcd = Set(checked(&self.is_pcd));
        model.pcd_description = Set(non_blank(&self.pcd_description));
        model.rg = Set(self.rg.trim().to_string());
        model.rg_issuer = Set(self.rg_issuer.trim().to_string());
        model.email = Set(self.email.trim().to_lowercase());
        model.phone = Set(self.phone.trim().to_string());
        model.whatsapp = Set(non_blank(&self.whatsapp));
        model.cep = Set(valid.cep);
        model.street = Set(self.street.trim().to_string());
        model.address_number = Set(self.address_number.trim().to_string());
        model.complement = Set(non_blank(&self.complement));
        model.neighborhood = Set(self.neighborhood.trim().to_string());
        model.city = Set(self.city.trim().to_string());
        model.address_state = Set(valid.address_state);
        model.cultural_organization = Set(self.cultural_organization.trim().to_string());
        model.cultural_segment = Set(self.cultural_segment.trim().to_string());
        model.role_in_organization = Set(non_blank(&self.role_in_organization));
        model.years_active = Set(valid.years_active);
        model.accessibility_needs = Set(non_blank(&self.accessibility_needs));
        model.dietary_restriction = Set(non_blank(&self.dietary_restriction));
        model.shirt_size = Set(valid.shirt_size);
        model.needs_lodging = Set(checked(&self.needs_lodging));
        model.needs_transport = Set(checked(&self.needs_transport));
        model.departure_city = Set(non_blank(&self.departure_city));
        model.emergency_contact_name = Set(self.emergency_contact_name.trim().to_string());
        model.emergency_contact_phone = Set(self.emergency_contact_phone.trim().to_string());
        model.consent_data_use = Set(checked(&self.consent_data_use));
        model.consent_image_use = Set(checked(&self.consent_image_use));
        model.consent_code_of_conduct = Set(checked(&self.consent_code_of_conduct));
        model.updated_at = Set(chrono::Utc::now().naive_utc());
    }
}

impl From<&enrollment::Model> for EnrollmentForm {
    fn from(m: &enrollment::Model) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            social_name: text(&m.social_name),
            birth_date: m.birth_date.format("%Y-%m-%d").to_string(),
            gender_identity: m.gender_identity.clone(),
            sexual_orientation: text(&m.sexual_orientation),
            race_color: m.race_color.clone(),
            is_pcd: checkbox(m.is_pcd),
            pcd_description: text(&m.pcd_description),
            rg: m.rg.clone(),
            rg_issuer: m.rg_issuer.clone(),
            email: m.email.clone(),
            phone: m.phone.clone(),
            whatsapp: text(&m.whatsapp),
            cep: m.cep.clone(),
            street: m.street.clone(),
            address_number: m.address_number.clone(),
            complement: text(&m.complement),
            neighborhood: m.neighborhood.clone(),
            city: m.city.clone(),
            address_state: m.address_state.clone(),
            cultural_organization: m.cultural_organization.clone(),
            cultural_segment: m.cultural_segment.clone(),
            role_in_organization: text(&m.role_in_organization),
            years_active: m.years_active.to_string(),
            accessibility_needs: text(&m.accessibility_needs),
            dietary_restriction: text(&m.dietary_restriction),
            shirt_size: m.shirt_size.clone(),
            needs_lodging: checkbox(m.needs_lodging),
            needs_transport: checkbox(m.needs_transport),
            departure_city: text(&m.departure_city),
            emergency_contact_name: m.emergency_contact_name.clone(),
            emergency_contact_phone: m.emergency_contact_phone.clone(),
            consent_data_use: checkbox(m.consent_data_use),
            consent_image_use: checkbox(m.consent_image_use),
            consent_code_of_conduct: checkbox(m.consent_code_of_conduct),
        }
    }
}

pub async fn find_for_delegation(
    db: &DatabaseConnection,
    delegation_id: i32,
) -> Result<Option<enrollment::Model>, sea_orm::DbErr> {
    enrollment::Entity::find()
        .filter(enrollment::Column::DelegationId.eq(delegation_id))
        .one(db)
        .await
}

/// Inserts or replaces the enrollment of `delegation_id` and marks the
/// roster entry completed, in one transaction.
pub async fn save(
    db: &DatabaseConnection,
    delegation_id: i32,
    form: EnrollmentForm,
    valid: ValidEnrollment,
) -> AppResult<enrollment::Model> {
    let txn = db.begin().await?;

    let delegation = delegation::Entity::find_by_id(delegation_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let existing = enrollment::Entity::find()
        .filter(enrollment::Column::DelegationId.eq(delegation_id))
        .one(&txn)
        .await?;

    let saved = match existing {
        Some(existing) => {
            let mut model = existing.into_active_model();
            form.apply(valid, &mut model);
            model.update(&txn).await?
        }
        None => {
            let now = chrono::Utc::now().naive_utc();
            let mut model = enrollment::ActiveModel {
                delegation_id: Set(delegation_id),
                created_at: Set(now),
                ..Default::default()
            };
            form.apply(valid, &mut model);
            model.insert(&txn).await?
        }
    };

    if !delegation.completed {
        let mut delegation = delegation.into_active_model();
        delegation.completed = Set(true);
        delegation.updated_at = Set(chrono::Utc::now().naive_utc());
        delegation.update(&txn).await?;
    }

    txn.commit().await?;
    info!("Saved enrollment for delegation {}", delegation_id);
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::roster::tests::delegate;
    use crate::entities::delegation::DelegateType;
    use sea_orm::{DatabaseBackend, MockDatabase, Statement, TryIntoModel, Value};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn filled() -> EnrollmentForm {
        EnrollmentForm {
            birth_date: "1990-05-17".to_string(),
            gender_identity: "Mulher cis".to_string(),
            race_color: "Parda".to_string(),
            rg: "1234567".to_string(),
            rg_issuer: "SSP/BA".to_string(),
            email: "ana@example.org".to_string(),
            phone: "71 99999-0000".to_string(),
            cep: "40.015-970".to_string(),
            street: "Rua Chile".to_string(),
            address_number: "10".to_string(),
            neighborhood: "Centro".to_string(),
            city: "Salvador".to_string(),
            address_state: "ba".to_string(),
            cultural_organization: "Ponto de Cultura Ilê".to_string(),
            cultural_segment: "Música".to_string(),
            years_active: "12".to_string(),
            shirt_size: "m".to_string(),
            emergency_contact_name: "Joana".to_string(),
            emergency_contact_phone: "71 98888-0000".to_string(),
            consent_data_use: Some("on".to_string()),
            consent_image_use: Some("on".to_string()),
            consent_code_of_conduct: Some("on".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn complete_form_passes() {
        let valid = filled().check(today()).unwrap();
        assert_eq!(valid.cep, "40015970");
        assert_eq!(valid.address_state, "BA");
        assert_eq!(valid.years_active, 12);
        assert_eq!(valid.shirt_size, "M");
    }

    #[test]
    fn each_consent_checkbox_is_required() {
        let form = EnrollmentForm {
            consent_image_use: None,
            ..filled()
        };
        let errors = form.check(today()).unwrap_err();
        assert_eq!(errors, vec!["É preciso autorizar o uso de imagem".to_string()]);

        let none = EnrollmentForm {
            consent_data_use: None,
            consent_image_use: None,
            consent_code_of_conduct: None,
            ..filled()
        };
        assert_eq!(none.check(today()).unwrap_err().len(), 3);
    }

    #[test]
    fn empty_required_fields_are_reported() {
        let form = EnrollmentForm {
            city: String::new(),
            email: "not-an-email".to_string(),
            ..filled()
        };
        let errors = form.check(today()).unwrap_err();
        assert!(errors.contains(&"Informe a cidade".to_string()));
        assert!(errors.contains(&"Informe um e-mail válido".to_string()));
    }

    #[test]
    fn typed_fields_are_checked() {
        let form = EnrollmentForm {
            birth_date: "2030-01-01".to_string(),
            cep: "123".to_string(),
            address_state: "XX".to_string(),
            years_active: "muitos".to_string(),
            shirt_size: "XS".to_string(),
            is_pcd: Some("on".to_string()),
            ..filled()
        };
        let errors = form.check(today()).unwrap_err();
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn apply_writes_normalised_values() {
        let form = filled();
        let valid = form.clone().check(today()).unwrap();
        let mut active = enrollment::ActiveModel {
            delegation_id: Set(3),
            ..Default::default()
        };
        form.apply(valid, &mut active);
        assert_eq!(active.city.clone().unwrap(), "Salvador");
        assert_eq!(active.consent_data_use.clone().unwrap(), true);
        assert_eq!(active.social_name.clone().unwrap(), None);
    }

    fn stored(id: i32, delegation_id: i32) -> enrollment::Model {
        let form = filled();
        let valid = form.clone().check(today()).unwrap();
        let mut active = enrollment::ActiveModel {
            id: Set(id),
            delegation_id: Set(delegation_id),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };
        form.apply(valid, &mut active);
        active.try_into_model().unwrap()
    }

    fn statements(db: DatabaseConnection) -> Vec<Statement> {
        db.into_transaction_log()
            .iter()
            .flat_map(|t| t.statements().to_vec())
            .collect()
    }

    #[tokio::test]
    async fn first_save_inserts_and_completes_the_entry() {
        let pending = delegate(3, "52998224725", DelegateType::Eleito);
        let mut completed = pending.clone();
        completed.completed = true;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pending]])
            .append_query_results([Vec::<enrollment::Model>::new()])
            .append_query_results([vec![stored(10, 3)]])
            .append_query_results([vec![completed]])
            .into_connection();

        let form = filled();
        let valid = form.clone().check(today()).unwrap();
        let saved = save(&db, 3, form, valid).await.unwrap();
        assert_eq!(saved.delegation_id, 3);

        let log = statements(db);
        assert!(log.iter().any(|s| s.sql.starts_with(r#"INSERT INTO "enrollment""#)));
        let completion = log
            .iter()
            .find(|s| s.sql.starts_with(r#"UPDATE "delegation""#))
            .expect("delegation should be marked completed");
        assert!(completion.sql.contains(r#""completed""#));
        let values = completion.values.as_ref().unwrap();
        assert!(values.0.contains(&Value::Bool(Some(true))));
    }

    #[tokio::test]
    async fn later_save_updates_the_existing_enrollment() {
        let mut done = delegate(3, "52998224725", DelegateType::Eleito);
        done.completed = true;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![done]])
            .append_query_results([vec![stored(10, 3)]])
            .append_query_results([vec![stored(10, 3)]])
            .into_connection();

        let mut form = filled();
        form.city = "Feira de Santana".to_string();
        let valid = form.clone().check(today()).unwrap();
        let saved = save(&db, 3, form, valid).await.unwrap();
        assert_eq!(saved.id, 10);

        let log = statements(db);
        assert!(log.iter().any(|s| s.sql.starts_with(r#"UPDATE "enrollment""#)));
        assert!(!log.iter().any(|s| s.sql.starts_with("INSERT")));
        assert!(!log.iter().any(|s| s.sql.starts_with(r#"UPDATE "delegation""#)));
    }

    #[tokio::test]
    async fn saving_for_an_unknown_entry_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<delegation::Model>::new()])
            .into_connection();

        let form = filled();
        let valid = form.clone().check(today()).unwrap();
        let result = save(&db, 99, form, valid).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }
}
