//! The two read-mostly collaborators the core consumes: the user directory
//! (identities, roles, asset restrictions) and the asset directory
//! (machines and their operational status).

pub mod assets;
pub mod users;

pub use assets::{Asset, AssetDirectory, AssetId, AssetStatus};
pub use users::{Role, User, UserDirectory, UserId};
