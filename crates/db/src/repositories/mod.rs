//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod accident_repo;
pub mod auth_log_repo;
pub mod camera_repo;
pub mod session_repo;
pub mod user_repo;

pub use accident_repo::AccidentRepo;
pub use auth_log_repo::AuthLogRepo;
pub use camera_repo::CameraRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
