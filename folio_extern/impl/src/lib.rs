pub mod challenge;
pub mod http;
pub mod relay;
