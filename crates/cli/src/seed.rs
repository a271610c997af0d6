//! `lodgeflow seed` -- write the demo user directory.
//!
//! The server has no user management of its own; it reads a directory file
//! at startup. This produces the demo lodge cast: one GM, HR, a supervisor,
//! finance, a storekeeper, and HOD/staff pairs for two departments.

use std::path::Path;

use lodgeflow_core::Role;
use lodgeflow_storage::UserRecord;

fn user(
    id: &str,
    name: &str,
    role: Role,
    department: Option<&str>,
    leave_quota: i32,
) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{id}@lodge.com"),
        role,
        department: department.map(|d| d.to_string()),
        leave_quota,
    }
}

/// The demo directory.
pub(crate) fn demo_users() -> Vec<UserRecord> {
    vec![
        user("gm", "General Manager", Role::Gm, Some("Management"), 12),
        user("hr", "HR Manager", Role::Hr, Some("Human Resources"), 12),
        user("spv", "Supervisor Operational", Role::Supervisor, None, 12),
        user("finance", "Finance Manager", Role::Finance, None, 12),
        user("store", "Storekeeper", Role::Store, None, 12),
        user(
            "hod.housekeeping",
            "Head of Housekeeping",
            Role::Hod,
            Some("Housekeeping"),
            12,
        ),
        user(
            "staff.housekeeping",
            "Housekeeping Staff",
            Role::Staff,
            Some("Housekeeping"),
            12,
        ),
        user(
            "hod.cashier",
            "Head of Cashier",
            Role::Hod,
            Some("Cashier"),
            12,
        ),
        user(
            "staff.cashier",
            "Cashier Staff",
            Role::Staff,
            Some("Cashier"),
            12,
        ),
    ]
}

pub(crate) fn write_seed(out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let users = demo_users();
    let json = serde_json::to_string_pretty(&users)?;
    std::fs::write(out, json)?;
    eprintln!("Wrote {} users to {}", users.len(), out.display());
    Ok(())
}

/// Load a user directory file.
pub(crate) fn load_users(path: &Path) -> Result<Vec<UserRecord>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let users: Vec<UserRecord> = serde_json::from_str(&raw)
        .map_err(|e| format!("malformed user directory {}: {e}", path.display()))?;
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_directory_covers_every_approver_role() {
        let users = demo_users();
        for role in [
            Role::Hod,
            Role::Supervisor,
            Role::Finance,
            Role::Hr,
            Role::Gm,
            Role::Store,
        ] {
            assert!(
                users.iter().any(|u| u.role == role),
                "missing {role} in demo directory"
            );
        }
        // Every HOD carries a department.
        assert!(users
            .iter()
            .filter(|u| u.role == Role::Hod)
            .all(|u| u.department.is_some()));
    }
}
