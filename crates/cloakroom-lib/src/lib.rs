pub mod cli;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod progress;
pub mod verification;
pub mod wardrobe;

pub use error::CloakroomError;
pub use manifest::Manifest;
