pub mod challenge;
pub mod relay;
