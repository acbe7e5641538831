//! Procedural meshes for vegetation.
//!
//! Everything is built around unit-ish dimensions at the origin with +Y up;
//! per-instance model matrices place and scale them in the world.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

const _: () = assert!(std::mem::size_of::<MeshVertex>() == 24);

/// Indexed triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn push(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(MeshVertex {
            position: position.to_array(),
            normal: normal.to_array(),
        });
        index
    }

    /// Horizontal ring of `segments + 1` vertices (the seam is duplicated)
    /// with outward normals. Returns the index of the first vertex.
    fn push_ring(&mut self, centre: Vec3, radius: f32, segments: u32) -> u32 {
        let first = self.vertices.len() as u32;
        for i in 0..=segments {
            let angle = i as f32 / segments as f32 * TAU;
            let (sin, cos) = angle.sin_cos();
            let outward = Vec3::new(cos, 0.0, sin);
            self.push(centre + outward * radius, outward);
        }
        first
    }

    /// Join two rings pushed with the same segment count into a band.
    fn stitch(&mut self, lower: u32, upper: u32, segments: u32) {
        for i in 0..segments {
            let (l0, l1) = (lower + i, lower + i + 1);
            let (u0, u1) = (upper + i, upper + i + 1);
            self.indices.extend_from_slice(&[l0, u0, l1, l1, u0, u1]);
        }
    }

    fn quad(&mut self, corners: [Vec3; 4], normal: Vec3) {
        let base = self.vertices.len() as u32;
        for corner in corners {
            self.push(corner, normal);
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Upright cone with its base ring at `y = 0`.
pub fn cone(height: f32, base_radius: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let mut mesh = MeshData::default();
    let ring = mesh.push_ring(Vec3::ZERO, base_radius, segments);
    let apex = mesh.push(Vec3::new(0.0, height, 0.0), Vec3::Y);
    for i in 0..segments {
        mesh.indices.extend_from_slice(&[ring + i, apex, ring + i + 1]);
    }
    mesh
}

/// Open frustum from `bottom_radius` at `y = 0` to `top_radius` at `height`.
/// Equal radii give a cylinder.
pub fn cylinder(height: f32, bottom_radius: f32, top_radius: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let mut mesh = MeshData::default();
    let bottom = mesh.push_ring(Vec3::ZERO, bottom_radius, segments);
    let top = mesh.push_ring(Vec3::new(0.0, height, 0.0), top_radius, segments);
    mesh.stitch(bottom, top, segments);
    mesh
}

const TRUNK_HEIGHT: f32 = 0.7;
const TRUNK_BASE_RADIUS: f32 = 0.1;
const TRUNK_SEGMENTS: u32 = 16;

/// Bark trunk: three rings narrowing to 85% at mid-height and 60% at the
/// top, closed at the bottom.
pub fn tapered_trunk() -> MeshData {
    let mut mesh = MeshData::default();
    let rings = [
        (0.0, 1.0),
        (TRUNK_HEIGHT * 0.5, 0.85),
        (TRUNK_HEIGHT, 0.6),
    ]
    .map(|(y, taper)| {
        mesh.push_ring(
            Vec3::new(0.0, y, 0.0),
            TRUNK_BASE_RADIUS * taper,
            TRUNK_SEGMENTS,
        )
    });
    mesh.stitch(rings[0], rings[1], TRUNK_SEGMENTS);
    mesh.stitch(rings[1], rings[2], TRUNK_SEGMENTS);

    let centre = mesh.push(Vec3::ZERO, Vec3::NEG_Y);
    for i in 0..TRUNK_SEGMENTS {
        mesh.indices
            .extend_from_slice(&[rings[0] + i, rings[0] + i + 1, centre]);
    }
    mesh
}

/// Number of branch tiers on the procedural tree.
pub const BRANCH_LEVELS: u32 = 5;
const BRANCH_SEGMENTS: u32 = 6;
const BRANCH_RINGS: u32 = 3;

/// Branches radiating from the trunk at tier `level`.
pub fn branches_at_level(level: u32) -> u32 {
    4 + 2 * level
}

/// Stylised tree used when no model file is available: a tapered trunk with
/// five tiers of branches that get shorter, thinner and steeper going up.
pub fn branching_tree() -> MeshData {
    let mut mesh = cylinder(0.8, 0.1, 0.05, 12);

    for level in 0..BRANCH_LEVELS {
        let l = level as f32;
        let attach_height = 0.15 + l * 0.15;
        let length = 0.5 - l * 0.08;
        let radius = 0.03 - l * 0.004;
        let pitch = 0.35 + l * 0.05;
        let count = branches_at_level(level);

        for b in 0..count {
            let heading = b as f32 / count as f32 * TAU;
            let direction = Vec3::new(
                heading.sin() * pitch.cos(),
                pitch.sin(),
                heading.cos() * pitch.cos(),
            );

            let mut previous = None;
            for j in 0..BRANCH_RINGS {
                let t = j as f32 / (BRANCH_RINGS - 1) as f32;
                let centre = Vec3::new(0.0, attach_height, 0.0) + direction * length * t;
                let ring = mesh.push_ring(centre, radius * (1.0 - t * 0.6), BRANCH_SEGMENTS);
                if let Some(lower) = previous {
                    mesh.stitch(lower, ring, BRANCH_SEGMENTS);
                }
                previous = Some(ring);
            }
        }
    }
    mesh
}

/// Two vertical quads crossed at right angles, 0.8 tall.
pub fn grass_tuft() -> MeshData {
    let mut mesh = MeshData::default();
    let (half, height) = (0.15, 0.8);
    for (dx, dz) in [(half, half), (half, -half)] {
        let a = Vec3::new(-dx, 0.0, -dz);
        let b = Vec3::new(dx, 0.0, dz);
        let normal = (b - a).cross(Vec3::Y).normalize();
        mesh.quad(
            [a, b, b + Vec3::Y * height, a + Vec3::Y * height],
            normal,
        );
    }
    mesh
}

/// Upright 0.7 × 1.0 quad facing +Z, bottom edge centred on the origin.
pub fn leaf_card() -> MeshData {
    let mut mesh = MeshData::default();
    mesh.quad(
        [
            Vec3::new(-0.35, 0.0, 0.0),
            Vec3::new(0.35, 0.0, 0.0),
            Vec3::new(0.35, 1.0, 0.0),
            Vec3::new(-0.35, 1.0, 0.0),
        ],
        Vec3::Z,
    );
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_valid(mesh: &MeshData) {
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(
            mesh.indices
                .iter()
                .all(|&i| (i as usize) < mesh.vertices.len())
        );
    }

    #[test]
    fn test_cone_shape() {
        let mesh = cone(2.0, 0.5, 8);
        assert_eq!(mesh.vertices.len(), 9 + 1);
        assert_eq!(mesh.triangle_count(), 8);
        assert_indices_valid(&mesh);
        let top = mesh
            .vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::MIN, f32::max);
        assert_eq!(top, 2.0);
    }

    #[test]
    fn test_cone_faces_point_outward() {
        let mesh = cone(1.0, 1.0, 16);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|i| Vec3::from_array(mesh.vertices[i as usize].position));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            let radial = Vec3::new(centroid.x, 0.0, centroid.z);
            assert!(normal.dot(radial) > 0.0);
        }
    }

    #[test]
    fn test_cylinder_radii() {
        let mesh = cylinder(1.0, 0.4, 0.2, 6);
        assert_eq!(mesh.vertices.len(), 14);
        assert_eq!(mesh.triangle_count(), 12);
        assert_indices_valid(&mesh);
        let radius = |v: &MeshVertex| Vec3::new(v.position[0], 0.0, v.position[2]).length();
        assert!((radius(&mesh.vertices[0]) - 0.4).abs() < 1e-6);
        assert!((radius(&mesh.vertices[7]) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_segments_are_clamped() {
        assert_eq!(cylinder(1.0, 1.0, 1.0, 0).triangle_count(), 6);
    }

    #[test]
    fn test_trunk_tapers_upwards() {
        let mesh = tapered_trunk();
        assert_indices_valid(&mesh);
        let ring = (TRUNK_SEGMENTS + 1) as usize;
        let radius = |i: usize| {
            let p = mesh.vertices[i].position;
            Vec3::new(p[0], 0.0, p[2]).length()
        };
        assert!((radius(0) - 0.1).abs() < 1e-6);
        assert!((radius(ring) - 0.085).abs() < 1e-6);
        assert!((radius(2 * ring) - 0.06).abs() < 1e-6);
        assert_eq!(mesh.vertices[2 * ring].position[1], TRUNK_HEIGHT);
    }

    #[test]
    fn test_branching_tree_counts() {
        let mesh = branching_tree();
        assert_indices_valid(&mesh);

        let branches: u32 = (0..BRANCH_LEVELS).map(branches_at_level).sum();
        assert_eq!(branches, 40);

        let trunk_vertices = 2 * 13;
        let branch_vertices = branches * BRANCH_RINGS * (BRANCH_SEGMENTS + 1);
        assert_eq!(mesh.vertices.len() as u32, trunk_vertices + branch_vertices);

        let trunk_triangles = 12 * 2;
        let branch_triangles = branches * (BRANCH_RINGS - 1) * BRANCH_SEGMENTS * 2;
        assert_eq!(
            mesh.triangle_count() as u32,
            trunk_triangles + branch_triangles
        );
    }

    #[test]
    fn test_branches_stay_near_trunk() {
        let mesh = branching_tree();
        for v in &mesh.vertices {
            let p = Vec3::from_array(v.position);
            assert!(p.y >= 0.0 && p.y <= 1.0, "vertex {p} outside tree height");
            assert!(Vec3::new(p.x, 0.0, p.z).length() < 0.55);
        }
    }

    #[test]
    fn test_grass_and_leaf_quads() {
        let grass = grass_tuft();
        assert_eq!(grass.vertices.len(), 8);
        assert_eq!(grass.triangle_count(), 4);
        assert_indices_valid(&grass);

        let leaf = leaf_card();
        assert_eq!(leaf.vertices.len(), 4);
        assert_eq!(leaf.triangle_count(), 2);
        assert!(leaf.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }
}
