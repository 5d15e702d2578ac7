//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts

pub mod dataset_group;
pub mod dataset_version;
pub mod frame;
pub mod membership;
pub mod task;
