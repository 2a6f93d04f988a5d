use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assembly::non_blank;
use crate::entities::event::{self, EventKind};
use crate::entities::user;
use crate::util::states::normalize_uf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventForm {
    pub kind: Option<EventKind>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub estimated_attendance: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInput {
    pub kind: EventKind,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: String,
    pub theme: String,
    pub estimated_attendance: i32,
    pub state: Option<String>,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

impl EventForm {
    /// Validates the form on behalf of `author`. Representatives may only
    /// schedule forums, and always for their own state.
    pub fn parse(&self, author: &user::Model) -> Result<EventInput, Vec<String>> {
        let mut errors = Vec::new();

        let kind = self.kind.unwrap_or(EventKind::Forum);
        if kind == EventKind::Teia && !author.role.is_admin() {
            errors.push("Somente a administração agenda a Teia".to_string());
        }

        let title = non_blank(&self.title);
        if title.is_none() {
            errors.push("Informe o título".to_string());
        }
        let location = non_blank(&self.location);
        if location.is_none() {
            errors.push("Informe o local".to_string());
        }

        let start_date = parse_date(&self.start_date);
        let end_date = parse_date(&self.end_date);
        match (start_date, end_date) {
            (Some(start), Some(end)) if end < start => {
                errors.push("A data final não pode ser anterior à inicial".to_string())
            }
            (None, _) | (_, None) => errors.push("Informe datas válidas".to_string()),
            _ => {}
        }

        let estimated_attendance = match self.estimated_attendance.trim() {
            "" => 0,
            raw => raw.parse::<i32>().ok().filter(|n| *n >= 0).unwrap_or_else(|| {
                errors.push("Público estimado inválido".to_string());
                0
            }),
        };

        let state = if author.role.is_admin() {
            normalize_uf(&self.state)
        } else {
            author.state.clone()
        };

        match (title, location, start_date, end_date) {
            (Some(title), Some(location), Some(start_date), Some(end_date)) if errors.is_empty() => {
                Ok(EventInput {
                    kind,
                    title,
                    start_date,
                    end_date,
                    location,
                    theme: self.theme.trim().to_string(),
                    estimated_attendance,
                    state,
                })
            }
            _ => Err(errors),
        }
    }
}

impl From<&event::Model> for EventForm {
    fn from(m: &event::Model) -> Self {
        Self {
            kind: Some(m.kind),
            title: m.title.clone(),
            start_date: m.start_date.format("%Y-%m-%d").to_string(),
            end_date: m.end_date.format("%Y-%m-%d").to_string(),
            location: m.location.clone(),
            theme: m.theme.clone(),
            estimated_attendance: m.estimated_attendance.to_string(),
            state: m.state.clone().unwrap_or_default(),
        }
    }
}

/// Admins edit everything; representatives only what they created.
pub fn can_edit(user: &user::Model, event: &event::Model) -> bool {
    user.role.is_admin() || (user.role.can_manage_events() && event.owner_id == Some(user.id))
}

pub async fn upcoming(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Vec<event::Model>, DbErr> {
    event::Entity::find()
        .filter(event::Column::EndDate.gte(today))
        .order_by_asc(event::Column::StartDate)
        .all(db)
        .await
}

pub async fn past(
    db: &DatabaseConnection,
    today: NaiveDate,
    limit: u64,
) -> Result<Vec<event::Model>, DbErr> {
    event::Entity::find()
        .filter(event::Column::EndDate.lt(today))
        .order_by_desc(event::Column::EndDate)
        .limit(limit)
        .all(db)
        .await
}

pub async fn create(
    db: &DatabaseConnection,
    input: EventInput,
    owner: &user::Model,
) -> Result<event::Model, DbErr> {
    let now = chrono::Utc::now().naive_utc();
    let model = event::ActiveModel {
        kind: Set(input.kind),
        title: Set(input.title),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        location: Set(input.location),
        theme: Set(input.theme),
        estimated_attendance: Set(input.estimated_attendance),
        state: Set(input.state),
        owner_id: Set(Some(owner.id)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("User {} created event {}", owner.id, model.id);
    Ok(model)
}

pub async fn update(
    db: &DatabaseConnection,
    existing: event::Model,
    input: EventInput,
) -> Result<event::Model, DbErr> {
    let mut model = existing.into_active_model();
    model.kind = Set(input.kind);
    model.title = Set(input.title);
    model.start_date = Set(input.start_date);
    model.end_date = Set(input.end_date);
    model.location = Set(input.location);
    model.theme = Set(input.theme);
    model.estimated_attendance = Set(input.estimated_attendance);
    model.state = Set(input.state);
    model.updated_at = Set(chrono::Utc::now().naive_utc());
    model.update(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::Role;

    fn author(role: Role, state: Option<&str>) -> user::Model {
        let now = chrono::Utc::now().naive_utc();
        user::Model {
            id: 10,
            email: "a@example.org".to_string(),
            password_hash: String::new(),
            name: "A".to_string(),
            role,
            state: state.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn form() -> EventForm {
        EventForm {
            kind: Some(EventKind::Forum),
            title: "Fórum Estadual".to_string(),
            start_date: "2026-08-01".to_string(),
            end_date: "2026-08-03".to_string(),
            location: "Recife".to_string(),
            theme: "Cultura Viva".to_string(),
            estimated_attendance: "250".to_string(),
            state: "SP".to_string(),
        }
    }

    #[test]
    fn representative_forum_is_pinned_to_own_state() {
        let input = form().parse(&author(Role::Representante, Some("PE"))).unwrap();
        assert_eq!(input.state, Some("PE".to_string()));
        assert_eq!(input.estimated_attendance, 250);
    }

    #[test]
    fn only_admins_schedule_the_teia() {
        let teia = EventForm {
            kind: Some(EventKind::Teia),
            ..form()
        };
        assert!(teia.parse(&author(Role::Representante, Some("PE"))).is_err());
        let input = teia.parse(&author(Role::AdminGeral, None)).unwrap();
        assert_eq!(input.kind, EventKind::Teia);
        assert_eq!(input.state, Some("SP".to_string()));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let bad = EventForm {
            end_date: "2026-07-30".to_string(),
            ..form()
        };
        let errors = bad.parse(&author(Role::AdminGeral, None)).unwrap_err();
        assert_eq!(errors, vec!["A data final não pode ser anterior à inicial".to_string()]);
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let empty = EventForm::default();
        let errors = empty.parse(&author(Role::AdminGeral, None)).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn representatives_edit_only_their_events() {
        let now = chrono::Utc::now().naive_utc();
        let event = event::Model {
            id: 1,
            kind: EventKind::Forum,
            title: "F".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            location: "L".to_string(),
            theme: String::new(),
            estimated_attendance: 0,
            state: Some("PE".to_string()),
            owner_id: Some(10),
            created_at: now,
            updated_at: now,
        };
        assert!(can_edit(&author(Role::Representante, Some("PE")), &event));
        let mut other = author(Role::Representante, Some("PE"));
        other.id = 11;
        assert!(!can_edit(&other, &event));
        assert!(can_edit(&author(Role::AdminAuxiliar, None), &event));
        assert!(!can_edit(&author(Role::Membro, None), &event));
    }
}
