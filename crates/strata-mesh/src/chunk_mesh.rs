//! Chunk mesh data structure holding vertices and indices produced by the mesher.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use strata_voxel::{BlockId, Face};

/// Brightness multiplier per face, indexed by [`Face::index`].
pub const FACE_SHADE: [f32; 6] = [0.8, 0.8, 1.0, 0.5, 0.6, 0.6];

/// A single vertex in a chunk mesh, laid out for direct GPU upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// Position in chunk-local block units.
    pub position: [f32; 3],
    /// Texture coordinates, tiled across merged quads.
    pub uv: [f32; 2],
    /// Texture tile for this face of the block.
    pub tile_index: u32,
    /// Sky light in front of the face, normalised to 0–1.
    pub sky_light: f32,
    /// Per-face directional shade.
    pub shade: f32,
}

const_assert_eq!(std::mem::size_of::<MeshVertex>(), 32);

/// Metadata for a single merged quad, used for statistics and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuadInfo {
    /// Which face direction this quad belongs to.
    pub face: Face,
    /// Extent along the face's u axis.
    pub width: u8,
    /// Extent along the face's v axis.
    pub height: u8,
    /// Block type covered by the quad.
    pub block: BlockId,
}

/// The mesh output of a meshing pass.
#[derive(Clone, Debug, Default)]
pub struct ChunkMesh {
    /// Vertex buffer.
    pub vertices: Vec<MeshVertex>,
    /// Index buffer (triangles, 3 indices per triangle).
    pub indices: Vec<u32>,
    /// One entry per emitted quad.
    pub quads: Vec<QuadInfo>,
}

/// Rotates a quad-local UV by `rotation` quarter turns inside a `w`×`h` quad.
///
/// | `rotation` | Result |
/// |------------|--------|
/// | 0 | `[u, v]` |
/// | 1 | `[v, w - u]` (quarter turn) |
/// | 2 | `[w - u, h - v]` (half turn, both axes flipped) |
/// | 3 | `[h - v, u]` (three quarter turns) |
fn rotate_uv(u: f32, v: f32, w: f32, h: f32, rotation: u8) -> [f32; 2] {
    match rotation % 4 {
        1 => [v, w - u],
        2 => [w - u, h - v],
        3 => [h - v, u],
        _ => [u, v],
    }
}

impl ChunkMesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes one merged quad.
    ///
    /// `slice`, `u` and `v` are chunk-local block coordinates along the face's
    /// sweep axes; `w` × `h` is the quad extent. Corners are ordered so the
    /// triangles `0,1,2` and `0,2,3` wind counter-clockwise seen from outside.
    #[allow(clippy::too_many_arguments)]
    pub fn push_quad(
        &mut self,
        face: Face,
        slice: usize,
        u: usize,
        v: usize,
        w: usize,
        h: usize,
        block: BlockId,
        tile_index: u32,
        rotation: u8,
        sky_light: f32,
    ) {
        let (axis, u_axis, v_axis) = face.sweep_axes();
        let plane = if face.is_positive() {
            slice as f32 + 1.0
        } else {
            slice as f32
        };
        let (wf, hf) = (w as f32, h as f32);

        // (u, v) offsets of the four corners.
        let corners: [(f32, f32); 4] = if face.is_positive() {
            [(0.0, 0.0), (wf, 0.0), (wf, hf), (0.0, hf)]
        } else {
            [(0.0, 0.0), (0.0, hf), (wf, hf), (wf, 0.0)]
        };

        let base = self.vertices.len() as u32;
        let shade = FACE_SHADE[face.index()];
        for (du, dv) in corners {
            let mut position = [0.0f32; 3];
            position[axis] = plane;
            position[u_axis] = u as f32 + du;
            position[v_axis] = v as f32 + dv;
            self.vertices.push(MeshVertex {
                position,
                uv: rotate_uv(du, dv, wf, hf, rotation),
                tile_index,
                sky_light,
                shade,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);

        self.quads.push(QuadInfo {
            face,
            width: w as u8,
            height: h as u8,
            block,
        });
    }

    /// Number of quads emitted for `face`.
    pub fn count_quads_for_face(&self, face: Face) -> usize {
        self.quads.iter().filter(|q| q.face == face).count()
    }

    /// Unit faces covered by the quads of `face`.
    pub fn face_area(&self, face: Face) -> usize {
        self.quads
            .iter()
            .filter(|q| q.face == face)
            .map(|q| q.width as usize * q.height as usize)
            .sum()
    }

    pub fn quad_count(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// The vertex buffer as raw bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The index buffer as raw bytes for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
