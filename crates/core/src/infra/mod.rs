pub mod genai;
pub mod metrics;
pub mod wav;
