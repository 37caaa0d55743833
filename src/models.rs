use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a registration was submitted with an authenticated account.
/// Fixed at creation; drives pricing tier and reward eligibility downstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationRole {
    Member,
    NonMember,
}

/// A person's enrollment in one event occurrence.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: Uuid,
    pub event_id: String,
    pub account_id: Option<String>,
    pub full_name: String,
    pub student_number: String,
    pub school_email: String,
    pub contact_number: String,
    pub facebook_link: String,
    pub year_level: i32,
    pub section: String,
    pub professor: String,
    pub degree_program: String,
    pub role: RegistrationRole,
}

/// The three identity dimensions a duplicate-registration check matches on.
/// A single hit on any dimension means "already registered".
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationKeys {
    pub account_id: Option<String>,
    pub school_email: String,
    pub student_number: String,
}

impl Registration {
    pub fn keys(&self) -> RegistrationKeys {
        RegistrationKeys {
            account_id: self.account_id.clone(),
            school_email: self.school_email.clone(),
            student_number: self.student_number.clone(),
        }
    }
}

/// The time-in/time-out log entry for one person at one event occurrence.
///
/// Identity fields are a snapshot of the registration at time-in; later edits
/// to the member record never rewrite historical attendance. `time_in` is set
/// once at creation and `time_out` at most once afterwards, always >= `time_in`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub event_id: String,
    pub registration_id: Uuid,
    pub full_name: String,
    pub student_number: String,
    pub school_email: String,
    pub year_level: i32,
    pub degree_program: String,
    pub section: String,
    pub professor: String,
    pub role: RegistrationRole,
    pub time_in: DateTime<Utc>,
    pub time_out: Option<DateTime<Utc>>,
}

impl AttendanceRecord {
    /// Open a new record at `time_in`, copying the identity snapshot from the
    /// registration.
    pub fn open(registration: &Registration, time_in: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id: registration.event_id.clone(),
            registration_id: registration.id,
            full_name: registration.full_name.clone(),
            student_number: registration.student_number.clone(),
            school_email: registration.school_email.clone(),
            year_level: registration.year_level,
            degree_program: registration.degree_program.clone(),
            section: registration.section.clone(),
            professor: registration.professor.clone(),
            role: registration.role,
            time_in,
            time_out: None,
        }
    }
}
