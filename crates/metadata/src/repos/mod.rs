//! Repository traits for metadata operations.

pub mod caught;
pub mod species;
pub mod users;

pub use caught::CaughtSetRepo;
pub use species::SpeciesCacheRepo;
pub use users::UserRepo;
