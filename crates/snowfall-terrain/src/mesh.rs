//! Renderable grid mesh backing the snow layer.
//!
//! ## Vertex packing
//!
//! | Offset | Format    | Field        |
//! |--------|-----------|--------------|
//! | 0      | Float32x3 | position     |
//! | 12     | Float32x3 | normal       |
//! | 24     | Float32x2 | uv           |
//! | 32     | Float32   | snow depth   |

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// One terrain vertex. `position.y` is the bare ground; snow is carried
/// separately so the shader can blend it in.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub snow_depth: f32,
}

const _: () = assert!(std::mem::size_of::<TerrainVertex>() == 36);

/// Build a `resolution × resolution` grid over `[-width/2, width/2] × [-depth/2, depth/2]`.
///
/// `base_heights` is row-major (`z * resolution + x`) and must hold
/// `resolution²` entries.
pub(crate) fn build_grid(
    width: f32,
    depth: f32,
    resolution: usize,
    base_heights: &[f32],
) -> (Vec<TerrainVertex>, Vec<u32>) {
    debug_assert_eq!(base_heights.len(), resolution * resolution);

    let last = (resolution - 1) as f32;
    let step_x = width / last;
    let step_z = depth / last;

    let mut vertices = Vec::with_capacity(resolution * resolution);
    for z in 0..resolution {
        for x in 0..resolution {
            vertices.push(TerrainVertex {
                position: [
                    -width / 2.0 + x as f32 * step_x,
                    base_heights[z * resolution + x],
                    -depth / 2.0 + z as f32 * step_z,
                ],
                normal: [0.0; 3],
                uv: [x as f32 / last, z as f32 / last],
                snow_depth: 0.0,
            });
        }
    }

    accumulate_normals(&mut vertices, resolution);

    let quads = (resolution - 1) * (resolution - 1);
    let mut indices = Vec::with_capacity(quads * 6);
    for z in 0..resolution - 1 {
        for x in 0..resolution - 1 {
            let top_left = (z * resolution + x) as u32;
            let top_right = top_left + 1;
            let bottom_left = ((z + 1) * resolution + x) as u32;
            let bottom_right = bottom_left + 1;

            indices.extend_from_slice(&[top_left, bottom_left, top_right]);
            indices.extend_from_slice(&[top_right, bottom_left, bottom_right]);
        }
    }

    (vertices, indices)
}

/// Area-weighted vertex normals: each quad contributes the face normals of its
/// two triangles to their corners, then every sum is normalised.
fn accumulate_normals(vertices: &mut [TerrainVertex], resolution: usize) {
    let pos = |v: &TerrainVertex| Vec3::from_array(v.position);
    let mut sums = vec![Vec3::ZERO; vertices.len()];

    for z in 0..resolution - 1 {
        for x in 0..resolution - 1 {
            let i0 = z * resolution + x;
            let i1 = i0 + 1;
            let i2 = (z + 1) * resolution + x;
            let i3 = i2 + 1;

            let (v0, v1, v2, v3) = (
                pos(&vertices[i0]),
                pos(&vertices[i1]),
                pos(&vertices[i2]),
                pos(&vertices[i3]),
            );

            // Winding chosen so a flat grid yields +Y.
            let n1 = (v2 - v0).cross(v1 - v0);
            let n2 = (v2 - v1).cross(v3 - v1);

            for i in [i0, i1, i2] {
                sums[i] += n1;
            }
            for i in [i1, i2, i3] {
                sums[i] += n2;
            }
        }
    }

    for (vertex, sum) in vertices.iter_mut().zip(sums) {
        vertex.normal = sum.normalize_or(Vec3::Y).to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_counts() {
        let (vertices, indices) = build_grid(10.0, 10.0, 4, &[0.0; 16]);
        assert_eq!(vertices.len(), 16);
        assert_eq!(indices.len(), 3 * 3 * 6);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn test_grid_spans_footprint() {
        let (vertices, _) = build_grid(20.0, 8.0, 5, &[0.0; 25]);
        let first = vertices[0].position;
        let last = vertices[24].position;
        assert_eq!(first, [-10.0, 0.0, -4.0]);
        assert!((last[0] - 10.0).abs() < 1e-5);
        assert!((last[2] - 4.0).abs() < 1e-5);
        assert_eq!(vertices[24].uv, [1.0, 1.0]);
    }

    #[test]
    fn test_flat_grid_normals_point_up() {
        let (vertices, _) = build_grid(10.0, 10.0, 6, &[1.5; 36]);
        for v in &vertices {
            let n = Vec3::from_array(v.normal);
            assert!((n - Vec3::Y).length() < 1e-5, "normal {n} is not +Y");
        }
    }

    #[test]
    fn test_sloped_grid_normals_lean_downhill() {
        // Height rises with x, so normals must lean towards -x.
        let resolution = 4;
        let heights: Vec<f32> = (0..resolution * resolution)
            .map(|i| (i % resolution) as f32)
            .collect();
        let (vertices, _) = build_grid(3.0, 3.0, resolution, &heights);
        let n = Vec3::from_array(vertices[5].normal);
        assert!(n.x < 0.0 && n.y > 0.0, "unexpected normal {n}");
        assert!((n.length() - 1.0).abs() < 1e-5);
    }
}
