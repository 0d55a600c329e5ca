//! Synchronization engine and the coordinating pass pipeline.

pub mod coordinator;
pub mod engine;
pub mod result;

pub use coordinator::{
    SyncCoordinator,
    SyncError,
};
pub use engine::{
    reorder_by_reference,
    synchronize_dependent,
    synchronize_primary_dependent,
    synchronize_reference,
};
pub use result::{
    SyncReport,
    SyncResult,
};
