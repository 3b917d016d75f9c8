pub mod collision;
pub mod config;
pub mod error;
pub mod physics;

pub use collision::*;
pub use config::*;
pub use error::*;
pub use physics::*;
