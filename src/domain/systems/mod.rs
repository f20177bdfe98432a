pub mod physics;
pub mod scoring;
