//! Grass and tree scattering.

use std::f32::consts::TAU;
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use snowfall_terrain::HeightOracle;

use crate::asset::MeshSource;
use crate::mesh::{self, MeshData};

/// Snow amounts below this produce no caps at all.
pub const SNOW_CAP_THRESHOLD: f32 = 0.01;

/// Size class of a tree. Drawn with fixed odds at placement time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TreeTier {
    Tall,
    Medium,
    Short,
}

impl TreeTier {
    /// Map a uniform sample in `[0, 1)` to a tier: 20% tall, 45% medium, 35% short.
    pub fn from_roll(roll: f32) -> Self {
        if roll < 0.2 {
            Self::Tall
        } else if roll < 0.65 {
            Self::Medium
        } else {
            Self::Short
        }
    }

    /// Half-open range of uniform scales for this tier.
    pub fn scale_range(self) -> (f32, f32) {
        match self {
            Self::Tall => (2.0, 3.5),
            Self::Medium => (1.0, 2.0),
            Self::Short => (0.4, 0.95),
        }
    }
}

/// A placed tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeInstance {
    /// Base of the trunk, on the ground.
    pub position: Vec3,
    pub scale: f32,
    /// Rotation about +Y in radians.
    pub yaw: f32,
    /// Per-instance variation value in `[0, 1)`, fed to the shader.
    pub seed: f32,
    pub tier: TreeTier,
}

impl TreeInstance {
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_rotation_y(self.yaw),
            self.position,
        )
    }

    pub fn to_raw(&self) -> TreeInstanceRaw {
        TreeInstanceRaw::new(self.model_matrix(), self.seed)
    }
}

/// GPU layout of one tree instance: a column-major model matrix followed by
/// the variation seed, padded to 16-byte alignment.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TreeInstanceRaw {
    pub model: [[f32; 4]; 4],
    pub seed: f32,
    pub _padding: [f32; 3],
}

const _: () = assert!(std::mem::size_of::<TreeInstanceRaw>() == 80);

impl TreeInstanceRaw {
    pub fn new(model: Mat4, seed: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            seed,
            _padding: [0.0; 3],
        }
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }
}

/// Where the tree mesh currently in use came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeMeshOrigin {
    Procedural,
    File(PathBuf),
}

#[derive(Clone, Debug, PartialEq)]
pub struct VegetationSettings {
    pub seed: u64,
    /// Grass is hidden where the snow is deeper than this.
    pub hide_threshold: f32,
}

impl Default for VegetationSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            hide_threshold: 0.2,
        }
    }
}

/// Scatters grass and trees over a height field and keeps the meshes and
/// instance data needed to draw them.
pub struct VegetationInstancer {
    rng: ChaCha8Rng,
    hide_threshold: f32,
    grass: Vec<Vec3>,
    trees: Vec<TreeInstance>,
    batch: Vec<TreeInstanceRaw>,
    tree_mesh: MeshData,
    tree_origin: TreeMeshOrigin,
    trunk_mesh: MeshData,
    grass_mesh: MeshData,
    leaf_mesh: MeshData,
}

impl VegetationInstancer {
    pub fn new(settings: VegetationSettings) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(settings.seed),
            hide_threshold: settings.hide_threshold,
            grass: Vec::new(),
            trees: Vec::new(),
            batch: Vec::new(),
            tree_mesh: mesh::branching_tree(),
            tree_origin: TreeMeshOrigin::Procedural,
            trunk_mesh: mesh::tapered_trunk(),
            grass_mesh: mesh::grass_tuft(),
            leaf_mesh: mesh::leaf_card(),
        }
    }

    /// Replace all vegetation with `grass_count` tufts and `tree_count` trees
    /// scattered uniformly over the ground's footprint.
    pub fn generate(&mut self, ground: &dyn HeightOracle, grass_count: usize, tree_count: usize) {
        self.grass.clear();
        self.trees.clear();

        let footprint = ground.footprint();
        let rng = &mut self.rng;

        self.grass.extend((0..grass_count).map(|_| {
            let x = symmetric(rng, footprint.x);
            let z = symmetric(rng, footprint.y);
            Vec3::new(x, ground.height_at(x, z), z)
        }));

        self.trees.extend((0..tree_count).map(|_| {
            let x = symmetric(rng, footprint.x);
            let z = symmetric(rng, footprint.y);
            let tier = TreeTier::from_roll(rng.random::<f32>());
            let (lo, hi) = tier.scale_range();
            TreeInstance {
                position: Vec3::new(x, ground.height_at(x, z), z),
                scale: rng.random_range(lo..hi),
                yaw: rng.random_range(0.0..TAU),
                seed: rng.random::<f32>(),
                tier,
            }
        }));

        self.batch = self.trees.iter().map(TreeInstance::to_raw).collect();

        debug!(
            grass = self.grass.len(),
            trees = self.trees.len(),
            "Vegetation generated"
        );
    }

    /// Try each candidate path in turn and use the first mesh that loads.
    /// Returns `false`, keeping the procedural tree, when none do.
    pub fn load_tree_model<P: AsRef<Path>>(
        &mut self,
        source: &dyn MeshSource,
        candidates: &[P],
    ) -> bool {
        for candidate in candidates {
            let path = candidate.as_ref();
            match source.load(path) {
                Ok(mesh) => {
                    info!(
                        path = %path.display(),
                        triangles = mesh.triangle_count(),
                        "Loaded tree model"
                    );
                    self.tree_mesh = mesh;
                    self.tree_origin = TreeMeshOrigin::File(path.to_path_buf());
                    return true;
                }
                Err(e) => debug!(path = %path.display(), error = %e, "Tree model candidate rejected"),
            }
        }

        warn!(
            candidates = candidates.len(),
            "No tree model could be loaded, using procedural tree"
        );
        false
    }

    /// Instances for the white caps drawn on top of each tree. `snow_amount`
    /// is nominally in `[0, 1]`.
    pub fn snow_cap_instances(&self, snow_amount: f32) -> Vec<TreeInstanceRaw> {
        if snow_amount < SNOW_CAP_THRESHOLD {
            return Vec::new();
        }
        self.trees
            .iter()
            .map(|tree| {
                let offset = Vec3::new(0.0, 0.4 + 0.1 * snow_amount, 0.0);
                let model = Mat4::from_translation(tree.position + offset)
                    * Mat4::from_scale(Vec3::splat(tree.scale * (0.5 + 0.2 * snow_amount)));
                TreeInstanceRaw::new(model, tree.seed)
            })
            .collect()
    }

    /// Grass positions that are not buried under more than the hide threshold
    /// of snow.
    pub fn visible_grass(&self, ground: &dyn HeightOracle) -> Vec<Vec3> {
        self.grass
            .iter()
            .copied()
            .filter(|g| ground.snow_depth_at(g.x, g.z) <= self.hide_threshold)
            .collect()
    }

    pub fn grass(&self) -> &[Vec3] {
        &self.grass
    }

    pub fn trees(&self) -> &[TreeInstance] {
        &self.trees
    }

    pub fn tree_batch(&self) -> &[TreeInstanceRaw] {
        &self.batch
    }

    /// The tree batch as raw bytes, ready for a single buffer upload.
    pub fn tree_batch_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.batch)
    }

    pub fn tree_mesh(&self) -> &MeshData {
        &self.tree_mesh
    }

    pub fn tree_origin(&self) -> &TreeMeshOrigin {
        &self.tree_origin
    }

    pub fn trunk_mesh(&self) -> &MeshData {
        &self.trunk_mesh
    }

    pub fn grass_mesh(&self) -> &MeshData {
        &self.grass_mesh
    }

    pub fn leaf_mesh(&self) -> &MeshData {
        &self.leaf_mesh
    }

    pub fn hide_threshold(&self) -> f32 {
        self.hide_threshold
    }

    pub fn set_hide_threshold(&mut self, threshold: f32) {
        self.hide_threshold = threshold.max(0.0);
    }
}

fn symmetric(rng: &mut impl Rng, extent: f32) -> f32 {
    if extent > 0.0 {
        rng.random_range(-extent / 2.0..extent / 2.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use glam::{Vec2, Vec4};
    use snowfall_terrain::FlatGround;

    use crate::asset::MeshLoadError;

    /// Ground rising along x with snow piled on the +z half.
    struct Slope;

    impl HeightOracle for Slope {
        fn height_at(&self, x: f32, _z: f32) -> f32 {
            x * 0.1 + 5.0
        }

        fn footprint(&self) -> Vec2 {
            Vec2::new(40.0, 20.0)
        }

        fn snow_depth_at(&self, _x: f32, z: f32) -> f32 {
            if z > 0.0 { 0.5 } else { 0.0 }
        }
    }

    struct FakeSource(HashMap<PathBuf, MeshData>);

    impl MeshSource for FakeSource {
        fn load(&self, path: &Path) -> Result<MeshData, MeshLoadError> {
            self.0.get(path).cloned().ok_or(MeshLoadError::Empty)
        }
    }

    fn generated(grass: usize, trees: usize) -> VegetationInstancer {
        let mut veg = VegetationInstancer::new(VegetationSettings {
            seed: 11,
            ..Default::default()
        });
        veg.generate(&Slope, grass, trees);
        veg
    }

    #[test]
    fn test_counts_and_regeneration() {
        let mut veg = generated(50, 20);
        assert_eq!(veg.grass().len(), 50);
        assert_eq!(veg.trees().len(), 20);
        assert_eq!(veg.tree_batch().len(), 20);

        veg.generate(&Slope, 3, 0);
        assert_eq!(veg.grass().len(), 3);
        assert!(veg.trees().is_empty());
        assert!(veg.tree_batch_bytes().is_empty());
    }

    #[test]
    fn test_instances_sit_on_the_ground_inside_footprint() {
        let veg = generated(200, 200);
        for g in veg.grass() {
            assert!(g.x >= -20.0 && g.x < 20.0 && g.z >= -10.0 && g.z < 10.0);
            assert_eq!(g.y, Slope.height_at(g.x, g.z));
        }
        for t in veg.trees() {
            assert_eq!(t.position.y, Slope.height_at(t.position.x, t.position.z));
            assert!((0.0..TAU).contains(&t.yaw));
            assert!((0.0..1.0).contains(&t.seed));
            let (lo, hi) = t.tier.scale_range();
            assert!(t.scale >= lo && t.scale < hi);
        }
    }

    #[test]
    fn test_tier_odds() {
        assert_eq!(TreeTier::from_roll(0.0), TreeTier::Tall);
        assert_eq!(TreeTier::from_roll(0.19), TreeTier::Tall);
        assert_eq!(TreeTier::from_roll(0.2), TreeTier::Medium);
        assert_eq!(TreeTier::from_roll(0.64), TreeTier::Medium);
        assert_eq!(TreeTier::from_roll(0.65), TreeTier::Short);

        let veg = generated(0, 5_000);
        let tall = veg
            .trees()
            .iter()
            .filter(|t| t.tier == TreeTier::Tall)
            .count() as f32
            / 5_000.0;
        assert!((tall - 0.2).abs() < 0.03, "tall fraction {tall}");
    }

    #[test]
    fn test_same_seed_same_forest() {
        let a = generated(10, 10);
        let b = generated(10, 10);
        assert_eq!(a.trees(), b.trees());
        assert_eq!(a.grass(), b.grass());
    }

    #[test]
    fn test_batch_matrix_places_tree() {
        let veg = generated(0, 8);
        for (tree, raw) in veg.trees().iter().zip(veg.tree_batch()) {
            assert_eq!(raw.seed, tree.seed);
            let model = raw.model();
            assert!(model.w_axis.truncate().abs_diff_eq(tree.position, 1e-5));
            // Local +Y scaled by the tree's uniform scale.
            let up = model * Vec4::new(0.0, 1.0, 0.0, 0.0);
            assert!((up.y - tree.scale).abs() < 1e-4);
        }
        assert_eq!(veg.tree_batch_bytes().len(), 8 * 80);
    }

    #[test]
    fn test_flat_ground_zero_footprint() {
        let mut veg = VegetationInstancer::new(VegetationSettings::default());
        veg.generate(&FlatGround::new(1.0, Vec2::ZERO), 4, 4);
        assert!(veg.grass().iter().all(|g| *g == Vec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_snow_caps() {
        let veg = generated(0, 4);
        assert!(veg.snow_cap_instances(0.005).is_empty());

        let caps = veg.snow_cap_instances(1.0);
        assert_eq!(caps.len(), 4);
        for (tree, cap) in veg.trees().iter().zip(&caps) {
            let model = cap.model();
            let expected = tree.position + Vec3::new(0.0, 0.5, 0.0);
            assert!(model.w_axis.truncate().abs_diff_eq(expected, 1e-5));
            assert!((model.x_axis.x - tree.scale * 0.7).abs() < 1e-5);
        }
    }

    #[test]
    fn test_buried_grass_is_hidden() {
        let veg = generated(300, 0);
        let visible = veg.visible_grass(&Slope);
        assert!(!visible.is_empty());
        assert!(visible.len() < veg.grass().len());
        assert!(visible.iter().all(|g| g.z <= 0.0));
    }

    #[test]
    fn test_load_tree_model_uses_first_loadable_candidate() {
        let mut veg = VegetationInstancer::new(VegetationSettings::default());
        let source = FakeSource(HashMap::from([(
            PathBuf::from("assets/tree.obj"),
            mesh::leaf_card(),
        )]));

        assert!(veg.load_tree_model(&source, &["missing.obj", "assets/tree.obj"]));
        assert_eq!(
            veg.tree_origin(),
            &TreeMeshOrigin::File(PathBuf::from("assets/tree.obj"))
        );
        assert_eq!(veg.tree_mesh().triangle_count(), 2);
    }

    #[test]
    fn test_missing_tree_model_keeps_procedural_mesh() {
        let mut veg = VegetationInstancer::new(VegetationSettings::default());
        let source = FakeSource(HashMap::new());

        assert!(!veg.load_tree_model(&source, &["a.obj", "b.obj"]));
        assert_eq!(veg.tree_origin(), &TreeMeshOrigin::Procedural);
        assert_eq!(veg.tree_mesh(), &mesh::branching_tree());
    }
}
