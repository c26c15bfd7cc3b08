//! Host vertex format for streamed character geometry

use bytemuck::{Pod, Zeroable};

/// One host-space vertex: position, RGBA8 color, uv, normal
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct HostVertex {
    pub position: [f32; 3],
    pub color: [u8; 4],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

impl HostVertex {
    /// Degenerate, fully transparent vertex used to hide unused slots
    pub const HIDDEN: Self = Self {
        position: [0.0; 3],
        color: [0; 4],
        uv: [0.0; 2],
        normal: [0.0; 3],
    };

    pub const fn alpha(&self) -> u8 {
        self.color[3]
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<HostVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Unorm8x4,
                },
                wgpu::VertexAttribute {
                    offset: (std::mem::size_of::<[f32; 3]>() + std::mem::size_of::<[u8; 4]>())
                        as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: (std::mem::size_of::<[f32; 3]>()
                        + std::mem::size_of::<[u8; 4]>()
                        + std::mem::size_of::<[f32; 2]>())
                        as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<HostVertex>(), 36);
        let bytes = bytemuck::bytes_of(&HostVertex::HIDDEN);
        assert!(bytes.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_layout_matches_struct() {
        let layout = HostVertex::desc();
        assert_eq!(layout.array_stride, 36);
        let offsets: Vec<_> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 16, 24]);
    }
}
