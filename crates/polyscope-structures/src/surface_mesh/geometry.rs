//! Geometry computation methods for surface meshes.
//!
//! This module derives everything the shader programs read from raw
//! vertices and faces:
//! - Flattened face index ranges (`face_inds_start` / `face_inds_entries`)
//! - Fan triangulation, both as vertex and as corner indices
//! - Face and vertex normals
//! - The length scale used by world-space parameterizations

use glam::Vec3;

use super::SurfaceMesh;

/// Fan-triangulates flattened polygon faces into corner triples.
///
/// `face_inds_start` has one entry per face plus a final end offset. A face
/// with corners `c0..c(D-1)` yields `(c0, cj, cj+1)` for `j = 1..D-2`, in
/// face order; faces with fewer than three corners yield nothing.
pub fn fan_triangulate(face_inds_start: &[usize]) -> Vec<[usize; 3]> {
    let mut triangles = Vec::new();
    for range in face_inds_start.windows(2) {
        let (start, end) = (range[0], range[1]);
        if end < start + 3 {
            continue;
        }
        for j in (start + 1)..(end - 1) {
            triangles.push([start, j, j + 1]);
        }
    }
    triangles
}

impl SurfaceMesh {
    /// Recomputes all derived data.
    pub(super) fn recompute(&mut self) {
        self.compute_face_indices();
        self.compute_triangulation();
        self.compute_face_normals();
        self.compute_vertex_normals();
        self.compute_length_scale();
    }

    fn position(&self, vertex: u32) -> Vec3 {
        self.vertices
            .get(vertex as usize)
            .copied()
            .unwrap_or(Vec3::ZERO)
    }

    fn compute_face_indices(&mut self) {
        self.face_inds_start.clear();
        self.face_inds_entries.clear();
        self.face_inds_start.reserve(self.faces.len() + 1);

        self.face_inds_start.push(0);
        for face in &self.faces {
            self.face_inds_entries.extend_from_slice(face);
            self.face_inds_start.push(self.face_inds_entries.len());
        }
    }

    fn compute_triangulation(&mut self) {
        self.triangle_corners = fan_triangulate(&self.face_inds_start);
        self.triangulation = self
            .triangle_corners
            .iter()
            .map(|corners| corners.map(|c| self.face_inds_entries[c]))
            .collect();
    }

    /// Face normals from the first two edges of each face.
    fn compute_face_normals(&mut self) {
        self.face_normals = self
            .faces
            .iter()
            .map(|face| {
                if face.len() < 3 {
                    return Vec3::ZERO;
                }
                let v0 = self.position(face[0]);
                let v1 = self.position(face[1]);
                let v2 = self.position(face[2]);
                (v1 - v0).cross(v2 - v0).normalize_or_zero()
            })
            .collect();
    }

    /// Vertex normals as the area-weighted average of incident face normals.
    fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for (face, face_normal) in self.faces.iter().zip(&self.face_normals) {
            if face.len() < 3 {
                continue;
            }
            let v0 = self.position(face[0]);
            let mut area = 0.0;
            for i in 1..(face.len() - 1) {
                let v1 = self.position(face[i]);
                let v2 = self.position(face[i + 1]);
                area += (v1 - v0).cross(v2 - v0).length() * 0.5;
            }

            for &vi in face {
                if let Some(n) = normals.get_mut(vi as usize) {
                    *n += *face_normal * area;
                }
            }
        }

        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }
        self.vertex_normals = normals;
    }

    /// Bounding box diagonal, or 1 for an empty or degenerate mesh.
    fn compute_length_scale(&mut self) {
        let (min, max) = self.vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), &v| (min.min(v), max.max(v)),
        );
        let diagonal = (max - min).length();
        self.length_scale = if diagonal.is_finite() && diagonal > 0.0 {
            diagonal
        } else {
            1.0
        };
    }
}
