//! # Identities, Roles, and Team Memberships
//!
//! A [`Principal`] is rebuilt from the verified bearer token on every request.
//! [`TeamMembership`] records are persisted elsewhere and read-only here.

use serde::{Deserialize, Serialize};

/// Identifier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u32);

/// Identifier of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u32);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account role carried in the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access to every endpoint and resource.
    Administrator,
    /// Access limited by endpoint authorizations and resource controls.
    Standard,
}

impl Role {
    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Standard => "standard",
        }
    }
}

/// Role of a user inside one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    /// May manage the team's memberships.
    Leader,
    /// Regular member.
    Member,
}

/// The verified identity behind the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Account identifier.
    pub user_id: UserId,
    /// Login name, informational only.
    pub username: String,
    /// Account role.
    pub role: Role,
}

impl Principal {
    /// Whether this principal holds the administrator role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }
}

/// Binding of a user to a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TeamMembership {
    /// Membership record identifier.
    pub id: u32,
    /// The member.
    #[serde(rename = "UserID")]
    pub user_id: UserId,
    /// The team.
    #[serde(rename = "TeamID")]
    pub team_id: TeamId,
    /// Role within the team.
    pub role: MembershipRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Administrator).unwrap();
        assert_eq!(json, "\"administrator\"");
        let role: Role = serde_json::from_str("\"standard\"").unwrap();
        assert_eq!(role, Role::Standard);
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
        assert!(serde_json::from_str::<Role>("1").is_err());
    }

    #[test]
    fn membership_uses_pascal_case_wire_names() {
        let membership = TeamMembership {
            id: 3,
            user_id: UserId(7),
            team_id: TeamId(2),
            role: MembershipRole::Leader,
        };
        let value = serde_json::to_value(&membership).unwrap();
        assert_eq!(value["UserID"], 7);
        assert_eq!(value["TeamID"], 2);
        assert_eq!(value["Role"], "leader");
    }

    #[test]
    fn principal_is_admin() {
        let admin = Principal {
            user_id: UserId(1),
            username: "admin".into(),
            role: Role::Administrator,
        };
        let user = Principal {
            role: Role::Standard,
            ..admin.clone()
        };
        assert!(admin.is_admin());
        assert!(!user.is_admin());
    }
}
