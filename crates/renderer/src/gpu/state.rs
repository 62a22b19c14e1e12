use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::frame::{FramePlan, Geometry};
use crate::geometry::{build_grid, build_vector_with_head};
use crate::transform::{view_projection, FrameTransform};
use crate::types::RendererConfig;

use super::context::GpuContext;
use super::mesh::LineMesh;
use super::pipeline::LinePipeline;

/// Owns every GPU resource and executes [`FramePlan`]s against the surface.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: LinePipeline,
    grid: LineMesh,
    arrow: LineMesh,
    view_extent: f32,
    multisample_target: Option<MultisampleTarget>,
}

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }

    fn for_context(context: &GpuContext) -> Option<Self> {
        (context.sample_count > 1).then(|| {
            Self::new(
                &context.device,
                context.surface_format,
                context.size,
                context.sample_count,
            )
        })
    }
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        config: &RendererConfig,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, config.antialiasing)?;
        let pipeline =
            LinePipeline::new(&context.device, context.surface_format, context.sample_count);

        let grid_segments = build_grid(config.grid_half_extent);
        let (vector_x, vector_y) = config.sample_vector;
        let arrow_segments = build_vector_with_head(vector_x, vector_y, config.arrow_head);

        let grid = LineMesh::new(
            &context.device,
            &pipeline.uniform_layout,
            "grid vertices",
            &grid_segments,
        );
        let arrow = LineMesh::new(
            &context.device,
            &pipeline.uniform_layout,
            "arrow vertices",
            &arrow_segments,
        );
        tracing::debug!(
            grid_lines = grid_segments.len(),
            arrow_lines = arrow_segments.len(),
            "uploaded static geometry"
        );

        let multisample_target = MultisampleTarget::for_context(&context);

        Ok(Self {
            context,
            pipeline,
            grid,
            arrow,
            view_extent: config.view_extent,
            multisample_target,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);
        self.multisample_target = MultisampleTarget::for_context(&self.context);
    }

    /// Re-applies the surface configuration after `Lost` or `Outdated`.
    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    /// Clears, draws every call in `plan` in order, and presents.
    pub(crate) fn render(&mut self, plan: &FramePlan) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let projection = view_projection(
            self.view_extent,
            self.context.size.width,
            self.context.size.height,
        );
        let transform: FrameTransform = plan.transform.multiply(&projection);
        for draw in &plan.draws {
            self.mesh(draw.geometry)
                .write_uniforms(&self.context.queue, &transform, draw.color);
        }

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });

        let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };
        let [red, green, blue] = plan.clear_color;
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(red),
                            g: f64::from(green),
                            b: f64::from(blue),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline.pipeline);
            for draw in &plan.draws {
                self.mesh(draw.geometry).draw(&mut pass);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn mesh(&self, geometry: Geometry) -> &LineMesh {
        match geometry {
            Geometry::Grid => &self.grid,
            Geometry::Arrow => &self.arrow,
        }
    }
}
