pub mod checklist;
pub mod store;
pub mod types;

pub use store::WorkOrderStore;
pub use types::{
    Discipline, OrderStatus, Priority, Task, TaskId, WorkOrder, WorkOrderDraft, WorkOrderFilter,
    WorkOrderId,
};
