use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Patient,
    Physician,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Patient => write!(f, "PATIENT"),
            Role::Physician => write!(f, "PHYSICIAN"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

/// Medical specialty of a physician. Specialist-only routes (physio
/// evaluations) check this against the value carried in the token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Specialty {
    Physiatrist,
    Physiotherapist,
    Orthopedist,
    GeneralPractitioner,
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Specialty::Physiatrist => write!(f, "PHYSIATRIST"),
            Specialty::Physiotherapist => write!(f, "PHYSIOTHERAPIST"),
            Specialty::Orthopedist => write!(f, "ORTHOPEDIST"),
            Specialty::GeneralPractitioner => write!(f, "GENERAL_PRACTITIONER"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub specialty: Option<Specialty>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Role,
    pub specialty: Option<Specialty>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True when this user is the account identified by `id`.
    pub fn is(&self, id: &Uuid) -> bool {
        self.id == id.to_string()
    }

    pub fn uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.id).ok()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Role,
    pub specialty: Option<Specialty>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Physician).unwrap(), "\"PHYSICIAN\"");
        let role: Role = serde_json::from_str("\"PATIENT\"").unwrap();
        assert_eq!(role, Role::Patient);
        assert_eq!(Role::Admin.to_string(), "ADMIN");
    }

    #[test]
    fn test_specialty_wire_format() {
        assert_eq!(
            serde_json::to_string(&Specialty::GeneralPractitioner).unwrap(),
            "\"GENERAL_PRACTITIONER\""
        );
        assert_eq!(Specialty::Physiotherapist.to_string(), "PHYSIOTHERAPIST");
    }

    #[test]
    fn test_user_identity_helpers() {
        let id = Uuid::new_v4();
        let user = User {
            id: id.to_string(),
            email: None,
            role: Role::Patient,
            specialty: None,
            created_at: None,
        };

        assert!(user.is(&id));
        assert!(!user.is(&Uuid::new_v4()));
        assert_eq!(user.uuid(), Some(id));
        assert!(user.has_role(Role::Patient));
        assert!(!user.is_admin());
    }
}
