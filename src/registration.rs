//! Registration ledger.
//!
//! At most one registration per person per event, matched on any of three
//! identity dimensions: account id (when the submission carries an
//! authenticated account), school email, or student number. The existence
//! check here is a fast path; the store's insert-time key claims are the
//! arbiter, so a race between two submissions still resolves to a duplicate
//! for exactly one of them.

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, StoreError};
use crate::models::{Registration, RegistrationKeys, RegistrationRole};
use crate::store::Store;

/// A registration form submission. `account_id` is present when the caller
/// authenticated, and decides the MEMBER/NON_MEMBER tag.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub account_id: Option<String>,
    pub full_name: String,
    pub student_number: String,
    pub school_email: String,
    pub contact_number: String,
    #[serde(default)]
    pub facebook_link: String,
    pub year_level: i32,
    pub section: String,
    pub professor: String,
    pub degree_program: String,
}

impl RegistrationForm {
    fn keys(&self) -> RegistrationKeys {
        RegistrationKeys {
            account_id: self.account_id.clone(),
            school_email: self.school_email.clone(),
            student_number: self.student_number.clone(),
        }
    }
}

pub async fn register(
    store: &dyn Store,
    event_id: &str,
    form: RegistrationForm,
) -> Result<Registration, AppError> {
    if store.registration_exists(event_id, &form.keys()).await? {
        return Err(AppError::DuplicateRegistration);
    }

    let role = if form.account_id.is_some() {
        RegistrationRole::Member
    } else {
        RegistrationRole::NonMember
    };

    let registration = Registration {
        id: Uuid::new_v4(),
        event_id: event_id.to_string(),
        account_id: form.account_id,
        full_name: form.full_name,
        student_number: form.student_number,
        school_email: form.school_email,
        contact_number: form.contact_number,
        facebook_link: form.facebook_link,
        year_level: form.year_level,
        section: form.section,
        professor: form.professor,
        degree_program: form.degree_program,
        role,
    };

    match store.insert_registration(registration).await {
        Ok(registration) => Ok(registration),
        Err(StoreError::Duplicate) => Err(AppError::DuplicateRegistration),
        Err(err) => Err(err.into()),
    }
}

pub async fn is_registered(
    store: &dyn Store,
    event_id: &str,
    keys: &RegistrationKeys,
) -> Result<bool, AppError> {
    Ok(store.registration_exists(event_id, keys).await?)
}

#[cfg(test)]
mod tests {
    use super::{RegistrationForm, is_registered, register};
    use crate::error::AppError;
    use crate::models::{RegistrationKeys, RegistrationRole};
    use crate::store::MemoryStore;

    fn form(student_number: &str, school_email: &str) -> RegistrationForm {
        RegistrationForm {
            account_id: None,
            full_name: "Jane Doe".to_string(),
            student_number: student_number.to_string(),
            school_email: school_email.to_string(),
            contact_number: "0917".to_string(),
            facebook_link: String::new(),
            year_level: 3,
            section: "A".to_string(),
            professor: "Cruz".to_string(),
            degree_program: "BSCS".to_string(),
        }
    }

    #[tokio::test]
    async fn tagged_by_account_presence() {
        let store = MemoryStore::new();

        let guest = register(&store, "EVT1", form("S123", "jane@school.edu"))
            .await
            .unwrap();
        assert_eq!(guest.role, RegistrationRole::NonMember);

        let mut with_account = form("S456", "john@school.edu");
        with_account.account_id = Some("acct-1".to_string());
        let member = register(&store, "EVT1", with_account).await.unwrap();
        assert_eq!(member.role, RegistrationRole::Member);
    }

    #[tokio::test]
    async fn same_email_rejected_even_with_new_student_number() {
        let store = MemoryStore::new();
        register(&store, "EVT1", form("S123", "jane@school.edu"))
            .await
            .unwrap();

        let err = register(&store, "EVT1", form("S999", "jane@school.edu"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DuplicateRegistration));
    }

    #[tokio::test]
    async fn same_student_number_allowed_across_events() {
        let store = MemoryStore::new();

        register(&store, "EVT1", form("S123", "jane@school.edu"))
            .await
            .unwrap();
        register(&store, "EVT2", form("S123", "jane@school.edu"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn status_check_matches_any_dimension() {
        let store = MemoryStore::new();
        register(&store, "EVT1", form("S123", "jane@school.edu"))
            .await
            .unwrap();

        let by_email = RegistrationKeys {
            account_id: None,
            school_email: "jane@school.edu".to_string(),
            student_number: "S000".to_string(),
        };
        assert!(is_registered(&store, "EVT1", &by_email).await.unwrap());

        let unrelated = RegistrationKeys {
            account_id: None,
            school_email: "someone@school.edu".to_string(),
            student_number: "S000".to_string(),
        };
        assert!(!is_registered(&store, "EVT1", &unrelated).await.unwrap());
    }
}
