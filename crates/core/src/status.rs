//! Workflow status as a tagged variant.
//!
//! The original system modelled status as ad-hoc strings built by
//! concatenation (`"PENDING_" + role`). Here the token set is closed:
//! `Pending(role)`, `Approved`, `Rejected` or `Completed` -- nothing else is
//! representable. Wire form stays compatible with the legacy tokens.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::actor::Role;

/// Current position of an entity in its approval lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    /// Waiting on the given role's sign-off.
    Pending(Role),
    /// Every chain stage signed off. Terminal for all kinds except
    /// procurement, which Store may still move to `Completed`.
    Approved,
    /// Rejected at some stage. Terminal.
    Rejected,
    /// Procurement fulfilled by Store. Terminal.
    Completed,
}

impl Status {
    /// The role currently authorized to act, if any.
    pub fn pending_role(&self) -> Option<Role> {
        match self {
            Status::Pending(role) => Some(*role),
            _ => None,
        }
    }

    /// Terminal states admit no further chain transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Approved | Status::Rejected | Status::Completed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending(role) => write!(f, "PENDING_{role}"),
            Status::Approved => f.write_str("APPROVED"),
            Status::Rejected => f.write_str("REJECTED"),
            Status::Completed => f.write_str("COMPLETED"),
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVED" => Ok(Status::Approved),
            "REJECTED" => Ok(Status::Rejected),
            "COMPLETED" => Ok(Status::Completed),
            other => match other.strip_prefix("PENDING_") {
                Some(role) => role
                    .parse::<Role>()
                    .map(Status::Pending)
                    .map_err(|_| format!("unknown status token: {other}")),
                None => Err(format!("unknown status token: {other}")),
            },
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tokens_round_trip() {
        for status in [
            Status::Pending(Role::Hod),
            Status::Pending(Role::Supervisor),
            Status::Pending(Role::Finance),
            Status::Pending(Role::Hr),
            Status::Pending(Role::Gm),
            Status::Approved,
            Status::Rejected,
            Status::Completed,
        ] {
            let token = status.to_string();
            assert_eq!(token.parse::<Status>().unwrap(), status);
        }
    }

    #[test]
    fn legacy_tokens_parse() {
        assert_eq!(
            "PENDING_HOD".parse::<Status>().unwrap(),
            Status::Pending(Role::Hod)
        );
        assert_eq!("APPROVED".parse::<Status>().unwrap(), Status::Approved);
    }

    #[test]
    fn illegal_tokens_are_rejected() {
        assert!("PENDING_FOO".parse::<Status>().is_err());
        assert!("DONE".parse::<Status>().is_err());
        assert!("".parse::<Status>().is_err());
    }

    #[test]
    fn serde_uses_wire_tokens() {
        let json = serde_json::to_string(&Status::Pending(Role::Gm)).unwrap();
        assert_eq!(json, "\"PENDING_GM\"");
        let back: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Status::Pending(Role::Gm));
    }

    #[test]
    fn terminality() {
        assert!(!Status::Pending(Role::Hr).is_terminal());
        assert!(Status::Approved.is_terminal());
        assert!(Status::Rejected.is_terminal());
        assert!(Status::Completed.is_terminal());
    }
}
