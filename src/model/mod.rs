pub mod candidate;
pub mod config;
pub mod source;
pub mod stage;
pub mod workspace;
