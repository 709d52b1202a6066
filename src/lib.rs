// Library exports for weather-audit
// This allows integration tests and the binary to share the pipeline

pub mod common;
pub mod dashboard;
pub mod mock;
pub mod weather;
