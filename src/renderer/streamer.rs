//! Triangle soup → fixed-capacity host vertex buffer
//!
//! The simulation emits a different number of triangles every tick. The host
//! model was created once with room for `capacity` triangles, so each sync
//! rewrites the live prefix and hides whatever the previous, larger tick left
//! behind. Without the hide pass old limbs stay on screen.

use glam::{Affine3A, Mat3};

use super::vertex::HostVertex;
use crate::coords::{normal_matrix, to_host_space};
use crate::sim::TriangleSoup;

/// Owns one character's CPU-side vertex and index arrays
#[derive(Debug, Clone)]
pub struct GeometryStreamer {
    vertices: Vec<HostVertex>,
    indices: Vec<u16>,
    prev_triangle_count: usize,
    scale: f32,
    transform_normals: bool,
}

impl GeometryStreamer {
    /// `capacity` triangles; every vertex starts hidden
    pub fn new(capacity: usize, scale: f32) -> Self {
        let vertex_count = capacity * 3;
        // Index buffer is u16
        debug_assert!(
            vertex_count <= u16::MAX as usize + 1,
            "capacity {capacity} overflows the u16 index buffer"
        );
        Self {
            vertices: vec![HostVertex::HIDDEN; vertex_count],
            indices: (0..vertex_count).map(|i| i as u16).collect(),
            prev_triangle_count: 0,
            scale,
            transform_normals: false,
        }
    }

    /// Also map normals through the inverse-transpose (non-uniform host scale)
    pub fn with_normal_transform(mut self, enabled: bool) -> Self {
        self.transform_normals = enabled;
        self
    }

    pub fn capacity(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn vertices(&self) -> &[HostVertex] {
        &self.vertices
    }

    /// Identity triangle-list indices, fixed for the buffer's lifetime
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Triangle count written by the last sync
    pub fn live_triangles(&self) -> usize {
        self.prev_triangle_count
    }

    /// Rewrite the buffer from `soup`, seen through the host's inverse transform
    pub fn sync(&mut self, soup: &TriangleSoup, inverse: &Affine3A) {
        let capacity = self.capacity().min(soup.capacity());
        let mut count = soup.triangle_count as usize;
        if count > capacity {
            log::warn!(
                "Simulation emitted {} triangles, buffer holds {}; clamping",
                count,
                capacity
            );
            count = capacity;
        }

        let normals = self.transform_normals.then(|| normal_matrix(inverse));

        for v in 0..count * 3 {
            self.vertices[v] = load_vertex(soup, inverse, normals.as_ref(), self.scale, v);
        }

        for v in count * 3..self.prev_triangle_count * 3 {
            self.vertices[v] = HostVertex::HIDDEN;
        }

        self.prev_triangle_count = count;
    }
}

fn load_vertex(
    soup: &TriangleSoup,
    inverse: &Affine3A,
    normals: Option<&Mat3>,
    scale: f32,
    v: usize,
) -> HostVertex {
    let position = to_host_space(soup.vertex_position(v), inverse, scale);
    let normal = match normals {
        Some(m) => (*m * soup.vertex_normal(v)).normalize_or_zero(),
        None => soup.vertex_normal(v),
    };
    let [r, g, b] = soup.vertex_color(v);

    HostVertex {
        position: position.to_array(),
        color: [channel(r), channel(g), channel(b), 255],
        uv: soup.vertex_uv(v),
        normal: normal.to_array(),
    }
}

/// [0, 1] float → [0, 255] byte
#[inline]
fn channel(c: f32) -> u8 {
    (c * 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{HostTransform, host_inverse};
    use glam::Vec3;
    use proptest::prelude::*;

    const CAPACITY: usize = 16;

    fn soup_with(count: u16) -> TriangleSoup {
        let mut soup = TriangleSoup::with_capacity(CAPACITY);
        for t in 0..count as usize {
            let base = Vec3::new(t as f32 * 100.0, 0.0, 0.0);
            soup.set_triangle(
                t,
                [base, base + Vec3::X * 100.0, base + Vec3::Y * 100.0],
                Vec3::Z,
                [1.0, 0.5, 0.0],
            );
        }
        soup.triangle_count = count;
        soup
    }

    fn identity() -> Affine3A {
        host_inverse(&HostTransform::IDENTITY)
    }

    #[test]
    fn test_new_buffer_is_hidden() {
        let streamer = GeometryStreamer::new(CAPACITY, 0.01);
        assert_eq!(streamer.vertices().len(), CAPACITY * 3);
        assert!(streamer.vertices().iter().all(|v| v.alpha() == 0));
        assert_eq!(streamer.indices()[7], 7);
    }

    #[test]
    fn test_largest_capacity_indexes_every_vertex() {
        let capacity = (u16::MAX as usize + 1) / 3;
        let streamer = GeometryStreamer::new(capacity, 0.01);
        let last = streamer.indices().len() - 1;
        assert_eq!(streamer.indices()[last] as usize, last);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "overflows the u16 index buffer")]
    fn test_oversized_capacity_is_rejected() {
        GeometryStreamer::new(u16::MAX as usize, 0.01);
    }

    #[test]
    fn test_sync_converts_vertices() {
        let mut streamer = GeometryStreamer::new(CAPACITY, 0.01);
        streamer.sync(&soup_with(2), &identity());

        let v = streamer.vertices()[4];
        assert_eq!(v.position, [2.0, 0.0, 0.0]);
        assert_eq!(v.color, [255, 127, 0, 255]);
        assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        assert_eq!(v.uv, [0.0, 0.0]);
        assert_eq!(streamer.live_triangles(), 2);
        assert_eq!(streamer.vertices()[6].alpha(), 0);
    }

    #[test]
    fn test_sync_applies_host_inverse() {
        let host = HostTransform::from_position(Vec3::new(1.0, 0.0, 0.0));
        let mut streamer = GeometryStreamer::new(CAPACITY, 0.01);
        streamer.sync(&soup_with(1), &host_inverse(&host));
        // (0,0,0) sim → (0 - 1) * 0.01 in host-local space
        let p = streamer.vertices()[0].position;
        assert!((p[0] + 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_shrinking_count_clears_stale_triangles() {
        let mut streamer = GeometryStreamer::new(CAPACITY, 0.01);
        streamer.sync(&soup_with(5), &identity());
        streamer.sync(&soup_with(5), &identity());
        assert!(streamer.vertices()[..15].iter().all(|v| v.alpha() == 255));

        streamer.sync(&soup_with(0), &identity());
        assert!(streamer.vertices()[..15].iter().all(|v| *v == HostVertex::HIDDEN));
        assert_eq!(streamer.live_triangles(), 0);
    }

    #[test]
    fn test_overflowing_count_is_clamped() {
        let mut streamer = GeometryStreamer::new(4, 0.01);
        let mut soup = soup_with(4);
        soup.triangle_count = 200;
        streamer.sync(&soup, &identity());
        assert_eq!(streamer.live_triangles(), 4);
        assert!(streamer.vertices().iter().all(|v| v.alpha() == 255));
    }

    #[test]
    fn test_normal_transform_is_opt_in() {
        let host = HostTransform {
            scale: Vec3::new(4.0, 1.0, 1.0),
            ..HostTransform::IDENTITY
        };
        let mut soup = TriangleSoup::with_capacity(1);
        soup.set_triangle(0, [Vec3::ZERO; 3], Vec3::new(1.0, -1.0, 0.0).normalize(), [1.0; 3]);
        soup.triangle_count = 1;

        let mut plain = GeometryStreamer::new(1, 0.01);
        plain.sync(&soup, &host_inverse(&host));
        let n = plain.vertices()[0].normal;
        assert!((n[0] - n[1].abs()).abs() < 1e-6);

        let mut corrected = GeometryStreamer::new(1, 0.01).with_normal_transform(true);
        corrected.sync(&soup, &host_inverse(&host));
        let n = Vec3::from_array(corrected.vertices()[0].normal);
        assert!((n.length() - 1.0).abs() < 1e-5);
        assert!(n.x > n.y.abs());
    }

    proptest! {
        #[test]
        fn prop_no_ghost_geometry(counts in proptest::collection::vec(0u16..=CAPACITY as u16, 1..12)) {
            let mut streamer = GeometryStreamer::new(CAPACITY, 0.01);
            let mut max_seen = 0usize;
            for count in counts {
                streamer.sync(&soup_with(count), &identity());
                max_seen = max_seen.max(count as usize);
                let live = count as usize * 3;
                prop_assert!(streamer.vertices()[..live].iter().all(|v| v.alpha() == 255));
                prop_assert!(streamer.vertices()[live..max_seen * 3].iter().all(|v| v.alpha() == 0));
            }
        }
    }
}
