pub mod gravity;
pub mod gravity_body;
pub mod gravity_system;
pub mod physics_world;
pub mod rigid_body;

use serde::{Deserialize, Serialize};

pub use gravity::*;
pub use gravity_body::*;
pub use gravity_system::*;
pub use physics_world::*;
pub use rigid_body::*;

/// Which vector subset a body or gravity source works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpaceDimension {
    TwoD,
    #[default]
    ThreeD,
}
