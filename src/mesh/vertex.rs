//! Mesh vertex layout shared with the graphics backend

use bytemuck::{Pod, Zeroable};

/// One mesh vertex: position, outward face normal, flat block color.
///
/// `Pod` so the backend can upload vertex buffers with a straight byte copy.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

/// A chunk's renderable surface: quad list as indexed triangles.
///
/// Vertices are in chunk-local space; the backend translates by the chunk's
/// world origin. Each quad contributes 4 vertices and 6 indices, so `u16`
/// indices suffice for the worst-case chunk (a 3-D checkerboard).
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn quad_count(&self) -> usize {
        self.indices.len() / 6
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 9 * 4);
    }

    #[test]
    fn test_counts() {
        let mesh = MeshData {
            vertices: vec![MeshVertex::default(); 8],
            indices: vec![0; 12],
        };
        assert_eq!(mesh.quad_count(), 2);
        assert_eq!(mesh.triangle_count(), 4);
    }
}
