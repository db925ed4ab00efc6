//! The unit cube every instance draws.

use super::vertex::CubeVertex;

/// Outward normal and the two in-plane axes of each face, ordered so that
/// `u x v == normal` and the winding comes out counter-clockwise.
const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
];

/// Builds a cube of edge length `size` centered on the origin.
///
/// # Returns
/// 24 vertices, four per face so normals stay flat, and 36 indices
pub fn cube_mesh(size: f32) -> (Vec<CubeVertex>, Vec<u16>) {
    let half = size / 2.0;
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in FACES {
        let base = vertices.len() as u16;

        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = [
                (normal[0] + u[0] * su + v[0] * sv) * half,
                (normal[1] + u[1] * su + v[1] * sv) * half,
                (normal[2] + u[2] * su + v[2] * sv) * half,
            ];
            vertices.push(CubeVertex { position, normal });
        }

        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    #[test]
    fn cube_has_flat_faces_within_bounds() {
        let (vertices, indices) = cube_mesh(1.0);
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);

        for vertex in &vertices {
            assert!(vertex.position.iter().all(|c| c.abs() == 0.5));
        }
    }

    #[test]
    fn triangles_wind_counter_clockwise_from_outside() {
        let (vertices, indices) = cube_mesh(2.0);

        for triangle in indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|k| vertices[triangle[k] as usize].position);
            let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let ac = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let facing = cross(ab, ac);
            let normal = vertices[triangle[0] as usize].normal;

            let dot = facing[0] * normal[0] + facing[1] * normal[1] + facing[2] * normal[2];
            assert!(dot > 0.0);
        }
    }
}
