//! Greedy meshing: merges coplanar, same-type exposed faces into larger
//! rectangular quads to reduce triangle count.
//!
//! Each of the six face directions is meshed independently. For every slice
//! along the face axis a 16×16 mask records the block whose face is exposed
//! (the block is not air and the next cell along the face normal is air). The
//! mask is then consumed in row-major order: a run is grown along u while the
//! block type and the sky light in front of it repeat, then grown along v while
//! the whole row matches, and the rectangle is emitted and cleared.

use strata_voxel::{BlockId, BlockRegistry, CHUNK_SIZE, Chunk, Face, MAX_SKY_LIGHT};

use crate::chunk_mesh::ChunkMesh;
use crate::neighborhood::{FACE_AREA, NeighborFaces};

/// Converts sweep coordinates back to `(x, y, z)`.
#[inline]
fn to_xyz(axes: (usize, usize, usize), slice: usize, u: usize, v: usize) -> [usize; 3] {
    let mut p = [0usize; 3];
    p[axes.0] = slice;
    p[axes.1] = u;
    p[axes.2] = v;
    p
}

/// The cell one step along `face` from `p`: inside the chunk, or across the
/// boundary into the neighbour snapshot. Also returns its sky light.
#[inline]
fn across(chunk: &Chunk, neighbors: &NeighborFaces, face: Face, p: [usize; 3]) -> (BlockId, u8) {
    let n = face.normal();
    let q = [
        p[0] as i32 + n[0],
        p[1] as i32 + n[1],
        p[2] as i32 + n[2],
    ];
    match chunk.get_checked(q[0], q[1], q[2]) {
        Some(block) => {
            let (x, y, z) = (q[0] as usize, q[1] as usize, q[2] as usize);
            (block, chunk.sky_light().get(x, y, z))
        }
        None => (neighbors.sample(face, p[0], p[1], p[2]), MAX_SKY_LIGHT),
    }
}

/// Builds the merged quad mesh for `chunk`.
///
/// Faces on the chunk boundary are culled against `neighbors`; a side with no
/// snapshot is treated as open air. Tile indices and UV rotations come from
/// `registry` per block and face.
pub fn greedy_mesh(chunk: &Chunk, neighbors: &NeighborFaces, registry: &BlockRegistry) -> ChunkMesh {
    let mut mesh = ChunkMesh::new();
    let size = CHUNK_SIZE;
    // mask[v * size + u]: exposed block (AIR when none) and the light in front of it.
    let mut mask = [BlockId::AIR; FACE_AREA];
    let mut light = [0u8; FACE_AREA];

    for face in Face::ALL {
        let axes = face.sweep_axes();

        for slice in 0..size {
            for v in 0..size {
                for u in 0..size {
                    let p = to_xyz(axes, slice, u, v);
                    let block = chunk.get(p[0], p[1], p[2]);
                    let cell = v * size + u;
                    mask[cell] = BlockId::AIR;
                    if block.is_air() {
                        continue;
                    }
                    let (next, next_light) = across(chunk, neighbors, face, p);
                    if next.is_air() {
                        mask[cell] = block;
                        light[cell] = next_light;
                    }
                }
            }

            for v in 0..size {
                let mut u = 0;
                while u < size {
                    let block = mask[v * size + u];
                    if block.is_air() {
                        u += 1;
                        continue;
                    }
                    let lit = light[v * size + u];
                    let matches = |cell: usize| mask[cell] == block && light[cell] == lit;

                    let mut w = 1;
                    while u + w < size && matches(v * size + u + w) {
                        w += 1;
                    }

                    let mut h = 1;
                    'grow: while v + h < size {
                        for du in 0..w {
                            if !matches((v + h) * size + u + du) {
                                break 'grow;
                            }
                        }
                        h += 1;
                    }

                    let (tile, rotation) = registry.face_texture(block, face);
                    let sky = lit as f32 / MAX_SKY_LIGHT as f32;
                    mesh.push_quad(face, slice, u, v, w, h, block, tile as u32, rotation, sky);

                    for dv in 0..h {
                        for du in 0..w {
                            mask[(v + dv) * size + u + du] = BlockId::AIR;
                        }
                    }
                    u += w;
                }
            }
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use crate::chunk_mesh::MeshVertex;
    use strata_voxel::{BlockType, LightGrid, blocks};

    fn registry() -> BlockRegistry {
        BlockRegistry::with_defaults()
    }

    fn mesh(chunk: &Chunk) -> ChunkMesh {
        greedy_mesh(chunk, &NeighborFaces::none(), &registry())
    }

    /// Vertices belonging to quads of `face`.
    fn face_vertices(mesh: &ChunkMesh, face: Face) -> Vec<MeshVertex> {
        mesh.quads
            .iter()
            .enumerate()
            .filter(|(_, q)| q.face == face)
            .flat_map(|(i, _)| mesh.vertices[i * 4..i * 4 + 4].iter().copied())
            .collect()
    }

    /// Exposed unit faces counted cell by cell.
    fn naive_exposed(chunk: &Chunk, face: Face) -> usize {
        let n = face.normal();
        let mut count = 0;
        for z in 0..16i32 {
            for y in 0..16i32 {
                for x in 0..16i32 {
                    let Some(block) = chunk.get_checked(x, y, z) else {
                        continue;
                    };
                    if block.is_air() {
                        continue;
                    }
                    let next = chunk
                        .get_checked(x + n[0], y + n[1], z + n[2])
                        .unwrap_or(BlockId::AIR);
                    if next.is_air() {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    #[test]
    fn test_empty_chunk_produces_nothing() {
        assert!(mesh(&Chunk::new()).is_empty());
    }

    #[test]
    fn test_solid_isolated_chunk_one_quad_per_face() {
        let m = mesh(&Chunk::filled(blocks::STONE));
        for face in Face::ALL {
            assert_eq!(m.count_quads_for_face(face), 1, "{face:?}");
            assert_eq!(m.face_area(face), CHUNK_SIZE * CHUNK_SIZE);
        }
        assert_eq!(m.vertices.len(), 24);
        assert_eq!(m.indices.len(), 36);
    }

    #[test]
    fn test_single_block_six_unit_quads() {
        let mut chunk = Chunk::new();
        chunk.set(7, 8, 9, blocks::DIRT);
        let m = mesh(&chunk);
        assert_eq!(m.quad_count(), 6);
        assert!(m.quads.iter().all(|q| q.width == 1 && q.height == 1));
        for face in Face::ALL {
            assert_eq!(m.count_quads_for_face(face), 1);
        }
    }

    #[test]
    fn test_adjacent_same_type_merges() {
        let mut chunk = Chunk::new();
        chunk.set(3, 0, 3, blocks::STONE);
        chunk.set(4, 0, 3, blocks::STONE);
        let m = mesh(&chunk);
        assert_eq!(m.count_quads_for_face(Face::PosY), 1);
        let top = m.quads.iter().find(|q| q.face == Face::PosY).unwrap();
        assert_eq!(top.width as usize * top.height as usize, 2);
        assert!(top.width > 1 || top.height > 1);
        // Two end caps, one merged quad on each long side.
        assert_eq!(m.quad_count(), 6);
    }

    #[test]
    fn test_type_boundary_prevents_merge() {
        let mut chunk = Chunk::new();
        chunk.set(3, 0, 3, blocks::STONE);
        chunk.set(4, 0, 3, blocks::DIRT);
        let m = mesh(&chunk);
        assert_eq!(m.count_quads_for_face(Face::PosY), 2);
        assert_eq!(m.count_quads_for_face(Face::NegZ), 2);
        assert!(m.quads.iter().all(|q| q.width == 1 && q.height == 1));
    }

    #[test]
    fn test_layered_chunk_quads() {
        // Stone below y=5, dirt for y in 5..9, grass at y=9, air above.
        let mut chunk = Chunk::new();
        for z in 0..16 {
            for x in 0..16 {
                for y in 0..10 {
                    let block = match y {
                        0..5 => blocks::STONE,
                        5..9 => blocks::DIRT,
                        _ => blocks::GRASS,
                    };
                    chunk.set(x, y, z, block);
                }
            }
        }
        let m = mesh(&chunk);

        assert_eq!(m.count_quads_for_face(Face::PosY), 1);
        assert_eq!(m.count_quads_for_face(Face::NegY), 1);
        for face in [Face::PosX, Face::NegX, Face::PosZ, Face::NegZ] {
            assert_eq!(m.count_quads_for_face(face), 3, "{face:?}");
            assert_eq!(m.face_area(face), 16 * 10);
        }
        assert_eq!(m.quad_count(), 14);

        let top = m.quads.iter().find(|q| q.face == Face::PosY).unwrap();
        assert_eq!(top.block, blocks::GRASS);
        let top = face_vertices(&m, Face::PosY);
        assert!(top.iter().all(|v| v.position[1] == 10.0 && v.tile_index == 1));
    }

    #[test]
    fn test_bottom_face_culled_by_neighbor_below() {
        let chunk = Chunk::filled(blocks::STONE);
        let mut neighbors = NeighborFaces::none();
        neighbors.set(
            Face::NegY,
            NeighborFaces::capture(Face::NegY, &Chunk::filled(blocks::STONE)),
        );
        neighbors.set(
            Face::PosX,
            NeighborFaces::capture(Face::PosX, &Chunk::filled(BlockId::AIR)),
        );
        let m = greedy_mesh(&chunk, &neighbors, &registry());
        assert_eq!(m.count_quads_for_face(Face::NegY), 0);
        assert_eq!(m.count_quads_for_face(Face::PosX), 1);
        assert_eq!(m.quad_count(), 5);
    }

    #[test]
    fn test_partial_neighbor_splits_boundary_face() {
        let chunk = Chunk::filled(blocks::STONE);
        // Neighbour at +X has stone only in its bottom half.
        let mut neighbor = Chunk::new();
        for y in 0..8 {
            for z in 0..16 {
                neighbor.set(0, y, z, blocks::STONE);
            }
        }
        let mut neighbors = NeighborFaces::none();
        neighbors.set(Face::PosX, NeighborFaces::capture(Face::PosX, &neighbor));
        let m = greedy_mesh(&chunk, &neighbors, &registry());
        assert_eq!(m.face_area(Face::PosX), 8 * 16);
        let side = face_vertices(&m, Face::PosX);
        assert!(side.iter().all(|v| v.position[0] == 16.0 && v.position[1] >= 8.0));
    }

    #[test]
    fn test_area_matches_exposed_faces_random() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..4 {
            let mut chunk = Chunk::new();
            for b in chunk.blocks_mut().iter_mut() {
                if rng.random_bool(0.45) {
                    *b = BlockId(rng.random_range(1..4));
                }
            }
            let m = mesh(&chunk);
            for face in Face::ALL {
                assert_eq!(m.face_area(face), naive_exposed(&chunk, face), "{face:?}");
            }
        }
    }

    #[test]
    fn test_registry_rotation_applied() {
        let mut registry = registry();
        registry
            .register(
                BlockId(20),
                BlockType::solid("carved", 12).with_rotation(Face::PosY, 1),
            )
            .unwrap();
        let mut chunk = Chunk::new();
        chunk.set(0, 0, 0, BlockId(20));
        chunk.set(0, 0, 1, BlockId(20));
        let m = greedy_mesh(&chunk, &NeighborFaces::none(), &registry);
        let top = face_vertices(&m, Face::PosY);
        assert_eq!(top.len(), 4);
        assert!(top.iter().all(|v| v.tile_index == 12));
        // PosY sweeps u along z, so the merged quad is 2 wide and 1 high; a
        // quarter turn maps corner (0, 0) to (0, 2).
        assert_eq!(top[0].uv, [0.0, 2.0]);
    }

    #[test]
    fn test_sky_light_in_front_of_face() {
        let mut chunk = Chunk::new();
        chunk.set(5, 5, 5, blocks::STONE);
        let mut light = LightGrid::filled(MAX_SKY_LIGHT);
        light.set(5, 6, 5, 0);
        chunk.set_sky_light(light);
        let m = mesh(&chunk);
        assert!(face_vertices(&m, Face::PosY).iter().all(|v| v.sky_light == 0.0));
        assert!(face_vertices(&m, Face::PosX).iter().all(|v| v.sky_light == 1.0));
    }

    #[test]
    fn test_light_change_splits_merge() {
        let mut chunk = Chunk::new();
        chunk.set(0, 0, 0, blocks::STONE);
        chunk.set(1, 0, 0, blocks::STONE);
        let mut light = LightGrid::filled(MAX_SKY_LIGHT);
        light.set(0, 1, 0, 0);
        chunk.set_sky_light(light);
        let m = mesh(&chunk);

        assert_eq!(m.count_quads_for_face(Face::PosY), 2);
        let top = face_vertices(&m, Face::PosY);
        assert!(
            top.iter()
                .filter(|v| v.position[0] < 1.0)
                .all(|v| v.sky_light == 0.0)
        );
        assert!(
            top.iter()
                .filter(|v| v.position[0] > 1.0)
                .all(|v| v.sky_light == 1.0)
        );
        // The unlit column only touches the top face.
        assert_eq!(m.count_quads_for_face(Face::NegY), 1);
    }
}
