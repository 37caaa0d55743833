//! Storage abstraction.
//!
//! All registry, registration, and attendance state lives behind [`Store`],
//! passed explicitly to the domain operations. Uniqueness rules are enforced
//! by the store itself at insert time; callers' existence checks are fast
//! paths, never the arbiter. [`MemoryStore`] reproduces the production
//! constraint semantics under a single lock and backs tests and local runs.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{AttendanceRecord, Registration, RegistrationKeys};
use crate::user::Member;

/// Outcome of a conditional time-out write.
#[derive(Debug)]
pub enum CloseOutcome {
    Closed(AttendanceRecord),
    NoRecord,
    AlreadyClosed,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_member(&self, student_id: &str) -> Result<Option<Member>, StoreError>;

    async fn insert_member(&self, member: Member) -> Result<(), StoreError>;

    /// Atomically add to a member's point balance. Returns false when no such
    /// member exists.
    async fn add_points(&self, student_id: &str, amount: i64) -> Result<bool, StoreError>;

    /// Does any registration for this event match any of the identity keys?
    async fn registration_exists(
        &self,
        event_id: &str,
        keys: &RegistrationKeys,
    ) -> Result<bool, StoreError>;

    /// Insert a registration, claiming all of its identity keys. Fails with
    /// [`StoreError::Duplicate`] if any key is already claimed for the event.
    async fn insert_registration(
        &self,
        registration: Registration,
    ) -> Result<Registration, StoreError>;

    async fn find_registration(
        &self,
        event_id: &str,
        student_number: &str,
    ) -> Result<Option<Registration>, StoreError>;

    /// Insert an attendance record. Fails with [`StoreError::Duplicate`] if a
    /// record already exists for this (event, studentNumber).
    async fn insert_attendance(
        &self,
        record: AttendanceRecord,
    ) -> Result<AttendanceRecord, StoreError>;

    async fn find_attendance(
        &self,
        event_id: &str,
        student_number: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Set `time_out` on an open record. The write applies only if the record
    /// exists and is still open.
    async fn close_attendance(
        &self,
        event_id: &str,
        student_number: &str,
        time_out: DateTime<Utc>,
    ) -> Result<CloseOutcome, StoreError>;

    /// All attendance records for an event, most recent time-in first.
    async fn list_attendance(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, StoreError>;
}

#[derive(Default)]
struct Tables {
    members: HashMap<String, Member>,
    // (event_id, "dimension:value") pairs claimed by existing registrations
    registration_keys: HashSet<(String, String)>,
    // keyed by (event_id, student_number)
    registrations: HashMap<(String, String), Registration>,
    attendance: HashMap<(String, String), AttendanceRecord>,
}

fn key_fields(keys: &RegistrationKeys) -> Vec<String> {
    let mut fields = vec![
        format!("email:{}", keys.school_email),
        format!("number:{}", keys.student_number),
    ];
    if let Some(account_id) = &keys.account_id {
        fields.push(format!("account:{account_id}"));
    }
    fields
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_member(&self, student_id: &str) -> Result<Option<Member>, StoreError> {
        let tables = self.tables.lock().unwrap();

        Ok(tables.members.get(student_id).cloned())
    }

    async fn insert_member(&self, member: Member) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();

        tables.members.insert(member.student_id.clone(), member);
        Ok(())
    }

    async fn add_points(&self, student_id: &str, amount: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().unwrap();

        match tables.members.get_mut(student_id) {
            Some(member) => {
                member.points += amount;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn registration_exists(
        &self,
        event_id: &str,
        keys: &RegistrationKeys,
    ) -> Result<bool, StoreError> {
        let tables = self.tables.lock().unwrap();

        Ok(key_fields(keys)
            .into_iter()
            .any(|field| tables.registration_keys.contains(&(event_id.to_string(), field))))
    }

    async fn insert_registration(
        &self,
        registration: Registration,
    ) -> Result<Registration, StoreError> {
        let mut tables = self.tables.lock().unwrap();

        let fields = key_fields(&registration.keys());
        if fields
            .iter()
            .any(|field| tables.registration_keys.contains(&(registration.event_id.clone(), field.clone())))
        {
            return Err(StoreError::Duplicate);
        }

        for field in fields {
            tables.registration_keys.insert((registration.event_id.clone(), field));
        }
        tables.registrations.insert(
            (registration.event_id.clone(), registration.student_number.clone()),
            registration.clone(),
        );

        Ok(registration)
    }

    async fn find_registration(
        &self,
        event_id: &str,
        student_number: &str,
    ) -> Result<Option<Registration>, StoreError> {
        let tables = self.tables.lock().unwrap();

        Ok(tables
            .registrations
            .get(&(event_id.to_string(), student_number.to_string()))
            .cloned())
    }

    async fn insert_attendance(
        &self,
        record: AttendanceRecord,
    ) -> Result<AttendanceRecord, StoreError> {
        let mut tables = self.tables.lock().unwrap();

        let key = (record.event_id.clone(), record.student_number.clone());
        if tables.attendance.contains_key(&key) {
            return Err(StoreError::Duplicate);
        }

        tables.attendance.insert(key, record.clone());
        Ok(record)
    }

    async fn find_attendance(
        &self,
        event_id: &str,
        student_number: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let tables = self.tables.lock().unwrap();

        Ok(tables
            .attendance
            .get(&(event_id.to_string(), student_number.to_string()))
            .cloned())
    }

    async fn close_attendance(
        &self,
        event_id: &str,
        student_number: &str,
        time_out: DateTime<Utc>,
    ) -> Result<CloseOutcome, StoreError> {
        let mut tables = self.tables.lock().unwrap();

        let Some(record) = tables
            .attendance
            .get_mut(&(event_id.to_string(), student_number.to_string()))
        else {
            return Ok(CloseOutcome::NoRecord);
        };

        if record.time_out.is_some() {
            return Ok(CloseOutcome::AlreadyClosed);
        }

        record.time_out = Some(time_out.max(record.time_in));
        Ok(CloseOutcome::Closed(record.clone()))
    }

    async fn list_attendance(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, StoreError> {
        let tables = self.tables.lock().unwrap();

        let mut records: Vec<AttendanceRecord> = tables
            .attendance
            .values()
            .filter(|record| record.event_id == event_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.time_in.cmp(&a.time_in));

        Ok(records)
    }
}
