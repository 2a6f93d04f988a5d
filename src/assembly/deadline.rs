use chrono::{Duration, NaiveDate};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::entities::{
    event::{self, EventKind},
    user::Role,
};

/// Where the registration window stands relative to the next national assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeadlineStatus {
    /// No assembly on the calendar.
    Unscheduled,
    Open { deadline: NaiveDate, days_left: i64 },
    ClosesToday { deadline: NaiveDate },
    Closed { deadline: NaiveDate },
}

impl DeadlineStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, DeadlineStatus::Closed { .. })
    }

    pub fn message(&self) -> String {
        match self {
            DeadlineStatus::Unscheduled => "Nenhuma Teia agendada".to_string(),
            DeadlineStatus::Open { deadline, days_left } => format!(
                "Inscrições abertas até {} ({} dia(s) restante(s))",
                deadline.format("%d/%m/%Y"),
                days_left
            ),
            DeadlineStatus::ClosesToday { .. } => "Inscrições encerram hoje".to_string(),
            DeadlineStatus::Closed { deadline } => format!(
                "Inscrições encerradas em {}",
                deadline.format("%d/%m/%Y")
            ),
        }
    }
}

pub fn registration_deadline(assembly_start: NaiveDate, offset_days: i64) -> NaiveDate {
    assembly_start - Duration::days(offset_days)
}

pub fn status_for(
    assembly_start: Option<NaiveDate>,
    offset_days: i64,
    today: NaiveDate,
) -> DeadlineStatus {
    let Some(start) = assembly_start else {
        return DeadlineStatus::Unscheduled;
    };
    let deadline = registration_deadline(start, offset_days);
    let days_left = (deadline - today).num_days();
    match days_left {
        d if d > 0 => DeadlineStatus::Open {
            deadline,
            days_left: d,
        },
        0 => DeadlineStatus::ClosesToday { deadline },
        _ => DeadlineStatus::Closed { deadline },
    }
}

/// The assembly that governs registration on `today`: the earliest Teia that
/// has not ended, or else the most recent one. A Teia in progress or already
/// held keeps the window closed until the next one is scheduled.
pub async fn current_assembly(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Option<event::Model>, DbErr> {
    let pending = event::Entity::find()
        .filter(event::Column::Kind.eq(EventKind::Teia))
        .filter(event::Column::EndDate.gte(today))
        .order_by_asc(event::Column::StartDate)
        .one(db)
        .await?;
    if pending.is_some() {
        return Ok(pending);
    }

    event::Entity::find()
        .filter(event::Column::Kind.eq(EventKind::Teia))
        .order_by_desc(event::Column::StartDate)
        .one(db)
        .await
}

pub async fn current_status(
    db: &DatabaseConnection,
    offset_days: i64,
    today: NaiveDate,
) -> Result<DeadlineStatus, DbErr> {
    let assembly = current_assembly(db, today).await?;
    Ok(status_for(
        assembly.map(|a| a.start_date),
        offset_days,
        today,
    ))
}

/// Whether roster and enrollment changes are refused on `today`. Admins are
/// never refused; the delegate portal passes no role.
pub async fn changes_locked(
    db: &DatabaseConnection,
    offset_days: i64,
    today: NaiveDate,
    role: Option<Role>,
) -> Result<bool, DbErr> {
    if role.is_some_and(Role::bypasses_deadline) {
        return Ok(false);
    }
    Ok(current_status(db, offset_days, today).await?.is_closed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn deadline_is_offset_before_start() {
        assert_eq!(registration_deadline(date(2026, 12, 1), 30), date(2026, 11, 1));
    }

    #[test]
    fn open_today_and_closed_around_the_deadline() {
        let start = Some(date(2026, 12, 1));
        assert_eq!(
            status_for(start, 30, date(2026, 10, 30)),
            DeadlineStatus::Open {
                deadline: date(2026, 11, 1),
                days_left: 2
            }
        );
        assert_eq!(
            status_for(start, 30, date(2026, 11, 1)),
            DeadlineStatus::ClosesToday {
                deadline: date(2026, 11, 1)
            }
        );
        let closed = status_for(start, 30, date(2026, 11, 2));
        assert!(closed.is_closed());
    }

    #[test]
    fn no_assembly_means_unscheduled() {
        let status = status_for(None, 30, date(2026, 1, 1));
        assert_eq!(status, DeadlineStatus::Unscheduled);
        assert!(!status.is_closed());
    }

    fn teia(start: NaiveDate, end: NaiveDate) -> event::Model {
        let now = chrono::Utc::now().naive_utc();
        event::Model {
            id: 1,
            kind: EventKind::Teia,
            title: "Teia Nacional".to_string(),
            start_date: start,
            end_date: end,
            location: "Brasília".to_string(),
            theme: String::new(),
            estimated_attendance: 3000,
            state: None,
            owner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn current_status_reads_next_teia() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![teia(date(2026, 12, 1), date(2026, 12, 5))]])
            .into_connection();

        let status = current_status(&db, 30, date(2026, 10, 19)).await.unwrap();
        assert_eq!(
            status,
            DeadlineStatus::Open {
                deadline: date(2026, 11, 1),
                days_left: 13
            }
        );
    }

    #[tokio::test]
    async fn stays_closed_while_the_teia_runs() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![teia(date(2026, 12, 1), date(2026, 12, 5))]])
            .into_connection();

        let status = current_status(&db, 30, date(2026, 12, 3)).await.unwrap();
        assert_eq!(
            status,
            DeadlineStatus::Closed {
                deadline: date(2026, 11, 1)
            }
        );
        assert!(status.is_closed());
    }

    #[tokio::test]
    async fn stays_closed_after_the_last_teia() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                Vec::<event::Model>::new(),
                vec![teia(date(2026, 12, 1), date(2026, 12, 5))],
            ])
            .into_connection();

        let status = current_status(&db, 30, date(2027, 2, 10)).await.unwrap();
        assert!(status.is_closed());
    }

    #[tokio::test]
    async fn empty_calendar_is_unscheduled() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<event::Model>::new(), Vec::new()])
            .into_connection();

        let status = current_status(&db, 30, date(2026, 10, 19)).await.unwrap();
        assert_eq!(status, DeadlineStatus::Unscheduled);
    }

    #[tokio::test]
    async fn admins_edit_after_the_deadline() {
        // No results queued: a lookup would fail the test.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let locked = changes_locked(&db, 30, date(2026, 11, 20), Some(Role::AdminAuxiliar))
            .await
            .unwrap();
        assert!(!locked);
    }

    #[tokio::test]
    async fn representatives_are_locked_after_the_deadline() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![teia(date(2026, 12, 1), date(2026, 12, 5))]])
            .into_connection();
        let locked = changes_locked(&db, 30, date(2026, 11, 2), Some(Role::Representante))
            .await
            .unwrap();
        assert!(locked);
    }

    #[tokio::test]
    async fn representatives_edit_on_the_last_day() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![teia(date(2026, 12, 1), date(2026, 12, 5))]])
            .into_connection();
        let locked = changes_locked(&db, 30, date(2026, 11, 1), Some(Role::Representante))
            .await
            .unwrap();
        assert!(!locked);
    }

    #[tokio::test]
    async fn delegates_cannot_submit_during_the_teia() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![teia(date(2026, 12, 1), date(2026, 12, 5))]])
            .into_connection();
        let locked = changes_locked(&db, 30, date(2026, 12, 3), None).await.unwrap();
        assert!(locked);
    }
}
