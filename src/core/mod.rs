pub mod domain;
pub mod errors;
pub mod matcher;
pub mod traits;
