//! thud: swept-AABB collision detection over a sparse uniform grid.
//!
//! A world tracks axis-aligned rects keyed by caller-supplied handles and
//! answers point/rect/segment queries plus continuous collision checks for
//! attempted moves. The engine detects and measures; response policy (touch,
//! slide, bounce) is derived from the returned collision descriptors by the
//! caller.

pub mod api;
pub mod collision;
pub mod errors;
pub mod grid;
pub mod narrowphase;
pub mod types;
pub mod world;

pub use crate::api::{AabbKernelApi, CollisionWorldApi};
pub use crate::collision::Collision;
pub use crate::errors::{Error, Result};
pub use crate::grid::Grid;
pub use crate::narrowphase::Kernel;
pub use crate::types::*;
pub use crate::world::CollisionWorld;
