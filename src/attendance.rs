//! Time-in/time-out state machine.
//!
//! Per (event, person) the states are NOT_ARRIVED -> TIMED_IN -> TIMED_OUT,
//! with TIMED_OUT terminal. A time-in requires a registration for that exact
//! event and copies its identity snapshot; a time-out requires an open
//! record. The checks here are fast paths that make repeated client retries
//! land on a specific error instead of duplicating state; the store's
//! insert/close arbiters decide races.

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{AppError, StoreError};
use crate::models::{AttendanceRecord, RegistrationRole};
use crate::rewards;
use crate::store::{CloseOutcome, Store};

pub async fn time_in(
    store: &dyn Store,
    student_number: &str,
    event_id: &str,
) -> Result<AttendanceRecord, AppError> {
    let registration = store
        .find_registration(event_id, student_number)
        .await?
        .ok_or(AppError::NotRegistered)?;

    if store
        .find_attendance(event_id, student_number)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyTimedIn);
    }

    let record = AttendanceRecord::open(&registration, Utc::now());
    match store.insert_attendance(record).await {
        Ok(record) => Ok(record),
        Err(StoreError::Duplicate) => Err(AppError::AlreadyTimedIn),
        Err(err) => Err(err.into()),
    }
}

pub async fn time_out(
    store: &dyn Store,
    student_number: &str,
    event_id: &str,
) -> Result<AttendanceRecord, AppError> {
    let existing = store
        .find_attendance(event_id, student_number)
        .await?
        .ok_or(AppError::NoTimeIn)?;
    if existing.time_out.is_some() {
        return Err(AppError::AlreadyTimedOut);
    }

    match store
        .close_attendance(event_id, student_number, Utc::now())
        .await?
    {
        CloseOutcome::Closed(record) => Ok(record),
        CloseOutcome::NoRecord => Err(AppError::NoTimeIn),
        CloseOutcome::AlreadyClosed => Err(AppError::AlreadyTimedOut),
    }
}

/// Award attendance points to the member behind a completed record, if the
/// stay met the reward threshold. Never fails the time-out that triggered it.
pub async fn award_points(store: &dyn Store, record: &AttendanceRecord, min_duration_ms: i64) {
    if record.role != RegistrationRole::Member {
        return;
    }

    let verdict = rewards::is_eligible(record, min_duration_ms);
    if !verdict.eligible {
        return;
    }

    match store
        .add_points(&record.student_number, rewards::ATTENDANCE_POINTS)
        .await
    {
        Ok(true) => info!(
            "Awarded {} point(s) to {} for event {}",
            rewards::ATTENDANCE_POINTS,
            record.student_number,
            record.event_id
        ),
        Ok(false) => warn!(
            "No member record for {}, skipping point award",
            record.student_number
        ),
        Err(err) => warn!("Point award for {} failed: {err}", record.student_number),
    }
}

#[cfg(test)]
mod tests {
    use super::{time_in, time_out};
    use crate::error::AppError;
    use crate::registration::{RegistrationForm, register};
    use crate::store::MemoryStore;

    async fn registered_store() -> MemoryStore {
        let store = MemoryStore::new();
        register(
            &store,
            "EVT1",
            RegistrationForm {
                account_id: Some("acct-1".to_string()),
                full_name: "Jane Doe".to_string(),
                student_number: "S123".to_string(),
                school_email: "jane@school.edu".to_string(),
                contact_number: "0917".to_string(),
                facebook_link: String::new(),
                year_level: 3,
                section: "A".to_string(),
                professor: "Cruz".to_string(),
                degree_program: "BSCS".to_string(),
            },
        )
        .await
        .unwrap();
        store
    }

    #[tokio::test]
    async fn happy_path() {
        let store = registered_store().await;

        let opened = time_in(&store, "S123", "EVT1").await.unwrap();
        assert!(opened.time_out.is_none());
        assert_eq!(opened.full_name, "Jane Doe");

        let closed = time_out(&store, "S123", "EVT1").await.unwrap();
        assert!(closed.time_out.unwrap() >= closed.time_in);
    }

    #[tokio::test]
    async fn time_in_requires_registration() {
        let store = registered_store().await;

        let err = time_in(&store, "S999", "EVT1").await.unwrap_err();

        assert!(matches!(err, AppError::NotRegistered));
    }

    #[tokio::test]
    async fn registration_is_per_event() {
        let store = registered_store().await;

        let err = time_in(&store, "S123", "EVT2").await.unwrap_err();

        assert!(matches!(err, AppError::NotRegistered));
    }

    #[tokio::test]
    async fn second_time_in_rejected() {
        let store = registered_store().await;
        time_in(&store, "S123", "EVT1").await.unwrap();

        let err = time_in(&store, "S123", "EVT1").await.unwrap_err();

        assert!(matches!(err, AppError::AlreadyTimedIn));
    }

    #[tokio::test]
    async fn time_out_requires_time_in() {
        let store = registered_store().await;

        let err = time_out(&store, "S123", "EVT1").await.unwrap_err();

        assert!(matches!(err, AppError::NoTimeIn));
    }

    #[tokio::test]
    async fn second_time_out_rejected() {
        let store = registered_store().await;
        time_in(&store, "S123", "EVT1").await.unwrap();
        time_out(&store, "S123", "EVT1").await.unwrap();

        let err = time_out(&store, "S123", "EVT1").await.unwrap_err();

        assert!(matches!(err, AppError::AlreadyTimedOut));
    }
}
