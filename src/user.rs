use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Organization role tiers. Everything above `Member` counts as an officer
/// for pricing and event administration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Executives,
    Secretariat,
    SecretariatJuniorOfficer,
    FinanceJuniorOfficer,
    JuniorOfficer,
    Member,
}

impl Role {
    pub fn is_officer(self) -> bool {
        !matches!(self, Role::Member)
    }
}

/// A person with a durable account in the registry.
///
/// Created at enrollment. The point balance is the only field this service
/// mutates, via atomic point awards on reward-eligible attendance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub student_id: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub school_email: String,
    pub contact_number: String,
    pub role: Role,
    pub points: i64,
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn officer_tiers() {
        assert!(Role::Admin.is_officer());
        assert!(Role::Executives.is_officer());
        assert!(Role::Secretariat.is_officer());
        assert!(Role::SecretariatJuniorOfficer.is_officer());
        assert!(Role::FinanceJuniorOfficer.is_officer());
        assert!(Role::JuniorOfficer.is_officer());
        assert!(!Role::Member.is_officer());
    }
}
