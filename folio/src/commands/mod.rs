pub mod draft;
pub mod send;
