use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::assets::AssetId;

pub type UserId = u64;

/// Closed set of roles. Capability resolution lives in `crate::permissions`
/// and is keyed on this enum, never on the wire string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Admin")]
    Admin,
    #[serde(rename = "E-Supervisor")]
    ESupervisor,
    #[serde(rename = "M-Supervisor")]
    MSupervisor,
    #[serde(rename = "Mechaniker")]
    Mechaniker,
    #[serde(rename = "Elektriker")]
    Elektriker,
    #[serde(rename = "RSC")]
    Rsc,
}

impl Role {
    pub fn is_supervisor(self) -> bool {
        matches!(self, Role::ESupervisor | Role::MSupervisor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Admin => "Admin",
            Role::ESupervisor => "E-Supervisor",
            Role::MSupervisor => "M-Supervisor",
            Role::Mechaniker => "Mechaniker",
            Role::Elektriker => "Elektriker",
            Role::Rsc => "RSC",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "e-supervisor" => Ok(Role::ESupervisor),
            "m-supervisor" => Ok(Role::MSupervisor),
            "mechaniker" => Ok(Role::Mechaniker),
            "elektriker" => Ok(Role::Elektriker),
            "rsc" => Ok(Role::Rsc),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    /// Deactivated users stay in the directory (they appear in historic
    /// name snapshots) but can no longer act or receive assignments.
    pub active: bool,
    /// Asset ids this user is restricted to. Empty means unrestricted
    /// within the role rules, not "restricted to nothing".
    pub assigned_assets: Vec<AssetId>,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            active: true,
            assigned_assets: Vec::new(),
        }
    }

    pub fn restricted_to(mut self, assets: Vec<AssetId>) -> Self {
        self.assigned_assets = assets;
        self
    }
}

/// Read access to all users; write access is confined to administrative
/// flows (upsert and deactivate; users are never removed).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserDirectory {
    users: BTreeMap<UserId, User>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        }
    }

    pub fn upsert(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn deactivate(&mut self, id: UserId) -> bool {
        match self.users.get_mut(&id) {
            Some(user) => {
                user.active = false;
                info!(user.id = id, "user deactivated");
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn all(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// First active user carrying the given role, in id order.
    pub fn find_active_by_role(&self, role: Role) -> Option<&User> {
        self.users.values().find(|u| u.active && u.role == role)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deactivated_users_are_kept_but_skipped_for_role_lookup() {
        let mut dir = UserDirectory::from_users([
            User::new(1, "Meier", Role::MSupervisor),
            User::new(2, "Huber", Role::MSupervisor),
        ]);

        assert_eq!(dir.find_active_by_role(Role::MSupervisor).unwrap().id, 1);
        assert!(dir.deactivate(1));
        assert_eq!(dir.find_active_by_role(Role::MSupervisor).unwrap().id, 2);
        // Still present for historic lookups
        assert_eq!(dir.get(1).unwrap().name, "Meier");
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn role_round_trips_through_wire_name() {
        let json = serde_json::to_string(&Role::ESupervisor).unwrap();
        assert_eq!(json, "\"E-Supervisor\"");
        let back: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Role::ESupervisor);
        assert_eq!("m-supervisor".parse::<Role>().unwrap(), Role::MSupervisor);
        assert!("foreman".parse::<Role>().is_err());
    }
}
