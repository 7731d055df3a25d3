// Role → capability resolution and asset visibility.
// Pure functions of their inputs; no error paths by contract.

use serde::{Deserialize, Serialize};

use crate::directory::{Asset, AssetId, Role, User};

/// Fixed capability set resolved from a role.
///
/// `Default` is the fully restrictive set, which doubles as the fallback
/// for anything that cannot be resolved to a known role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_assign_orders: bool,
    pub can_delete_orders: bool,
    pub can_view_all_users: bool,
    pub can_manage_users: bool,
}

impl Capabilities {
    /// Capability lookup over the closed role set.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin | Role::ESupervisor | Role::MSupervisor => Self {
                can_assign_orders: true,
                can_delete_orders: true,
                can_view_all_users: true,
                can_manage_users: true,
            },
            Role::Mechaniker | Role::Elektriker | Role::Rsc => Self::default(),
        }
    }
}

/// Whether `user` may see and act on the asset with the given id.
///
/// Admin always may. Everyone else may iff the asset appears in their
/// assigned list, or that list is empty. An empty list means "no
/// restriction configured", not "restricted to nothing".
pub fn can_access_asset(user: &User, asset_id: AssetId) -> bool {
    if user.role == Role::Admin {
        return true;
    }
    user.assigned_assets.is_empty() || user.assigned_assets.contains(&asset_id)
}

/// The subset of `assets` visible to `user`, in the given order.
pub fn visible_assets<'a>(user: &User, assets: &'a [Asset]) -> Vec<&'a Asset> {
    assets
        .iter()
        .filter(|a| can_access_asset(user, a.id))
        .collect()
}
