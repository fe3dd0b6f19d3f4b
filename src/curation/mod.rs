pub mod apply;
pub mod duplicates;
pub mod staging;

pub use apply::ApplyResult;
pub use duplicates::{DuplicateGroup, GroupMember};
pub use staging::{StagingArea, StagingItem, StagingStatus, SubmitOutcome};
