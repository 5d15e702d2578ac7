//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod dataset_group_repo;
pub mod dataset_version_repo;
pub mod frame_membership_repo;
pub mod frame_repo;
pub mod task_membership_repo;
pub mod task_repo;

pub use dataset_group_repo::DatasetGroupRepo;
pub use dataset_version_repo::DatasetVersionRepo;
pub use frame_membership_repo::FrameMembershipRepo;
pub use frame_repo::FrameRepo;
pub use task_membership_repo::TaskMembershipRepo;
pub use task_repo::TaskRepo;
