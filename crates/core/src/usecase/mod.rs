pub mod app_service;
pub mod fanout;
pub mod job_store;
pub mod planner;
pub mod rerun;
pub mod sequential;
pub mod video;
