//! Grass and tree placement over a height field, plus the meshes they are drawn with.
//!
//! Trees are packed into one contiguous instance batch ready for a single
//! upload; grass is kept as plain positions so it can be culled when buried
//! under snow.

mod asset;
mod instancer;
pub mod mesh;

pub use asset::{MeshLoadError, MeshSource, ObjMeshSource, parse_obj};
pub use instancer::{
    SNOW_CAP_THRESHOLD, TreeInstance, TreeInstanceRaw, TreeMeshOrigin, TreeTier,
    VegetationInstancer, VegetationSettings,
};
pub use mesh::{MeshData, MeshVertex};
