//! Winter terrain: a noise height field carrying a snow layer that accumulates
//! from deposits and melts after a dormancy window.

mod ground;
mod heightmap;
mod mesh;
mod snow;

pub use ground::{FlatGround, GroundSurface, HeightOracle, SnowSink};
pub use heightmap::{HeightmapParams, HeightmapSampler};
pub use mesh::TerrainVertex;
pub use snow::{NEIGHBOUR_LIFETIME_FACTOR, NEIGHBOUR_SHARE, SnowCell, SnowTerrain, TerrainSettings};
