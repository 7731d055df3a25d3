// Leitstand Library - Work Order Lifecycle & Notification Core
// This exposes the core components for testing and integration

pub mod config;
pub mod directory;
pub mod error;
pub mod journal;
pub mod lifecycle;
pub mod notifications;
pub mod permissions;
pub mod persistence;
pub mod telemetry;
pub mod workorder;

// Re-export key types for easy access
pub use config::{config, init_config, LeitstandConfig};
pub use directory::{Asset, AssetDirectory, AssetId, AssetStatus, Role, User, UserDirectory, UserId};
pub use error::CoreError;
pub use journal::{Comment, CommentId, CommentKind, CommentLog};
pub use lifecycle::{EditRequest, OrderCoordinator};
pub use notifications::{Notification, NotificationCenter, NotificationId, NotificationKind};
pub use permissions::{can_access_asset, visible_assets, Capabilities};
pub use persistence::{PersistenceError, Snapshot, SnapshotStore};
pub use telemetry::{generate_correlation_id, init_telemetry};
pub use workorder::{
    Discipline, OrderStatus, Priority, Task, TaskId, WorkOrder, WorkOrderDraft, WorkOrderFilter,
    WorkOrderId, WorkOrderStore,
};
