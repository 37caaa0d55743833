//! Decrypted QR payload parsing.
//!
//! Wire format: 6 fields joined by `|`, order fixed:
//! `studentId|firstName|middleName|lastName|yearLevel|degreeProgram`.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const DELIMITER: char = '|';
const FIELD_COUNT: usize = 6;

/// Unverified identity data recovered from a scanned QR code.
///
/// Only the field count is validated here. Empty fields pass through as empty
/// strings; matching against the member registry is the verifier's job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaim {
    pub student_id: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub year_level: String,
    pub degree_program: String,
}

pub fn parse(plaintext: &str) -> Result<IdentityClaim, AppError> {
    let parts: Vec<&str> = plaintext.split(DELIMITER).collect();

    if parts.len() != FIELD_COUNT {
        return Err(AppError::MalformedPayload);
    }

    Ok(IdentityClaim {
        student_id: parts[0].to_string(),
        first_name: parts[1].to_string(),
        middle_name: parts[2].to_string(),
        last_name: parts[3].to_string(),
        year_level: parts[4].to_string(),
        degree_program: parts[5].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::parse;

    #[test]
    fn six_fields_in_order() {
        let claim = parse("a|b|c|d|e|f").unwrap();

        assert_eq!(claim.student_id, "a");
        assert_eq!(claim.first_name, "b");
        assert_eq!(claim.middle_name, "c");
        assert_eq!(claim.last_name, "d");
        assert_eq!(claim.year_level, "e");
        assert_eq!(claim.degree_program, "f");
    }

    #[test]
    fn wrong_arity_rejected() {
        assert!(parse("a|b|c").is_err());
        assert!(parse("a|b|c|d|e|f|g").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn empty_fields_pass_through() {
        let claim = parse("a||c|d|e|f").unwrap();

        assert_eq!(claim.first_name, "");
        assert_eq!(claim.middle_name, "c");
    }
}
