//! Roles and the acting identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A workforce role. The approval chains are ordered lists of these.
///
/// Wire form is the legacy uppercase token (`"HOD"`, `"GM"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Staff,
    Hod,
    Supervisor,
    Finance,
    Hr,
    Gm,
    Store,
}

impl Role {
    /// The uppercase wire token for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "STAFF",
            Role::Hod => "HOD",
            Role::Supervisor => "SUPERVISOR",
            Role::Finance => "FINANCE",
            Role::Hr => "HR",
            Role::Gm => "GM",
            Role::Store => "STORE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STAFF" => Ok(Role::Staff),
            "HOD" => Ok(Role::Hod),
            "SUPERVISOR" => Ok(Role::Supervisor),
            "FINANCE" => Ok(Role::Finance),
            "HR" => Ok(Role::Hr),
            "GM" => Ok(Role::Gm),
            "STORE" => Ok(Role::Store),
            other => Err(format!("unknown role token: {other}")),
        }
    }
}

/// A verified acting identity, issued by the identity collaborator.
///
/// The workflow engine never mutates an actor; the single exception is the
/// leave-quota decrement, which goes through the storage port as a
/// post-approval effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
    /// Department is required for HOD scoping; other roles act
    /// cross-department.
    pub department: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role, department: Option<&str>) -> Self {
        Self {
            id: id.into(),
            role,
            department: department.map(|d| d.to_string()),
        }
    }
}
