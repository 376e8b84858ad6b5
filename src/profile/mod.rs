pub mod profile_models;
pub mod profile_repository;

pub use profile_models::{Profile, UNKNOWN_DISPLAY_NAME};
pub use profile_repository::ProfileRepository;
