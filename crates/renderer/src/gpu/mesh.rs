use wgpu::util::DeviceExt;

use crate::geometry::{vertex_count, LineSegment};
use crate::transform::FrameTransform;
use crate::types::Rgb;

use super::uniforms::LineUniforms;

/// Immutable vertex buffer for one piece of static geometry, plus the
/// uniform buffer its draw reads from.
pub(crate) struct LineMesh {
    vertices: wgpu::Buffer,
    vertex_count: u32,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl LineMesh {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        segments: &[LineSegment],
    ) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(segments),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("line uniforms"),
            contents: bytemuck::bytes_of(&LineUniforms::new(
                &FrameTransform::IDENTITY,
                [1.0, 1.0, 1.0],
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("line bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });

        Self {
            vertices,
            vertex_count: vertex_count(segments),
            uniforms,
            bind_group,
        }
    }

    /// Queues this frame's transform and colour for the next submit.
    pub fn write_uniforms(&self, queue: &wgpu::Queue, transform: &FrameTransform, color: Rgb) {
        let uniforms = LineUniforms::new(transform, color);
        queue.write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&uniforms));
    }

    pub fn draw<'pass>(&self, pass: &mut wgpu::RenderPass<'pass>) {
        if self.vertex_count == 0 {
            return;
        }
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertices.slice(..));
        pass.draw(0..self.vertex_count, 0..1);
    }
}
