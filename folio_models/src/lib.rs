pub mod challenge;
pub mod contact;
pub mod relay;
