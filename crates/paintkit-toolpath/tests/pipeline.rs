#[path = "pipeline/common.rs"]
mod common;
#[path = "pipeline/properties.rs"]
mod properties;
#[path = "pipeline/scenarios.rs"]
mod scenarios;
#[path = "pipeline/scene_job.rs"]
mod scene_job;
