//! Reward eligibility.
//!
//! Members earn attendance points only for completed stays of at least the
//! minimum duration (one hour by default). The threshold is inclusive.

use serde::Serialize;

use crate::models::AttendanceRecord;

/// Default minimum stay, in milliseconds (one hour).
pub const DEFAULT_MIN_ATTENDANCE_MS: i64 = 3_600_000;

/// Points granted per reward-eligible attendance.
pub const ATTENDANCE_POINTS: i64 = 1;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

fn not_eligible(reason: &'static str) -> Eligibility {
    Eligibility {
        eligible: false,
        reason: Some(reason),
    }
}

pub fn is_eligible(record: &AttendanceRecord, min_duration_ms: i64) -> Eligibility {
    let Some(time_out) = record.time_out else {
        return not_eligible("not timed out");
    };

    let duration_ms = (time_out - record.time_in).num_milliseconds();
    if duration_ms < min_duration_ms {
        return not_eligible("below minimum duration");
    }

    Eligibility {
        eligible: true,
        reason: None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::{DEFAULT_MIN_ATTENDANCE_MS, is_eligible};
    use crate::models::{AttendanceRecord, RegistrationRole};

    fn record_with_stay(stay_ms: Option<i64>) -> AttendanceRecord {
        let time_in = Utc::now();
        AttendanceRecord {
            id: Uuid::new_v4(),
            event_id: "EVT1".to_string(),
            registration_id: Uuid::new_v4(),
            full_name: "Jane Doe".to_string(),
            student_number: "S123".to_string(),
            school_email: "jane@school.edu".to_string(),
            year_level: 3,
            degree_program: "BSCS".to_string(),
            section: "A".to_string(),
            professor: "Cruz".to_string(),
            role: RegistrationRole::Member,
            time_in,
            time_out: stay_ms.map(|ms| time_in + Duration::milliseconds(ms)),
        }
    }

    #[test]
    fn exactly_at_threshold_is_eligible() {
        let record = record_with_stay(Some(DEFAULT_MIN_ATTENDANCE_MS));

        assert!(is_eligible(&record, DEFAULT_MIN_ATTENDANCE_MS).eligible);
    }

    #[test]
    fn one_millisecond_short_is_not() {
        let record = record_with_stay(Some(DEFAULT_MIN_ATTENDANCE_MS - 1));
        let verdict = is_eligible(&record, DEFAULT_MIN_ATTENDANCE_MS);

        assert!(!verdict.eligible);
        assert_eq!(verdict.reason, Some("below minimum duration"));
    }

    #[test]
    fn open_record_is_never_eligible() {
        let record = record_with_stay(None);
        let verdict = is_eligible(&record, DEFAULT_MIN_ATTENDANCE_MS);

        assert!(!verdict.eligible);
        assert_eq!(verdict.reason, Some("not timed out"));
    }
}
