pub mod installer;
pub mod manifest;
pub mod registry;
pub mod scanner;
pub mod selector;
