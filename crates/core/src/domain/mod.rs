pub mod brand;
pub mod error;
pub mod job;
pub mod types;
pub mod video;
