//! Identity verification against the member registry.
//!
//! The student id is authoritative (it rode inside the encrypted payload);
//! the claimed names are a cross-check against a QR code being scanned under
//! someone else's name. Which field mismatched is never reported.

use crate::error::AppError;
use crate::qr::IdentityClaim;
use crate::store::Store;
use crate::user::Member;

pub async fn verify(store: &dyn Store, claim: &IdentityClaim) -> Result<Member, AppError> {
    let member = store
        .find_member(&claim.student_id)
        .await?
        .ok_or(AppError::UnknownMember)?;

    if member.first_name != claim.first_name || member.last_name != claim.last_name {
        return Err(AppError::IdentityMismatch);
    }

    Ok(member)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::verify;
    use crate::error::AppError;
    use crate::qr::IdentityClaim;
    use crate::store::{MemoryStore, Store};
    use crate::user::{Member, Role};

    fn jane() -> Member {
        Member {
            id: Uuid::new_v4(),
            student_id: "S123".to_string(),
            first_name: "Jane".to_string(),
            middle_name: Some("M".to_string()),
            last_name: "Doe".to_string(),
            school_email: "jane@school.edu".to_string(),
            contact_number: "0917".to_string(),
            role: Role::Member,
            points: 0,
        }
    }

    fn claim(student_id: &str, first: &str, last: &str) -> IdentityClaim {
        IdentityClaim {
            student_id: student_id.to_string(),
            first_name: first.to_string(),
            middle_name: "M".to_string(),
            last_name: last.to_string(),
            year_level: "3".to_string(),
            degree_program: "BSCS".to_string(),
        }
    }

    #[tokio::test]
    async fn known_member_with_matching_names() {
        let store = MemoryStore::new();
        store.insert_member(jane()).await.unwrap();

        let member = verify(&store, &claim("S123", "Jane", "Doe")).await.unwrap();

        assert_eq!(member.student_id, "S123");
    }

    #[tokio::test]
    async fn unknown_id_rejected() {
        let store = MemoryStore::new();

        let err = verify(&store, &claim("S999", "Jane", "Doe")).await.unwrap_err();

        assert!(matches!(err, AppError::UnknownMember));
    }

    #[tokio::test]
    async fn name_mismatch_rejected() {
        let store = MemoryStore::new();
        store.insert_member(jane()).await.unwrap();

        let err = verify(&store, &claim("S123", "Janet", "Doe")).await.unwrap_err();

        assert!(matches!(err, AppError::IdentityMismatch));
    }

    #[tokio::test]
    async fn names_are_case_sensitive() {
        let store = MemoryStore::new();
        store.insert_member(jane()).await.unwrap();

        let err = verify(&store, &claim("S123", "jane", "doe")).await.unwrap_err();

        assert!(matches!(err, AppError::IdentityMismatch));
    }
}
