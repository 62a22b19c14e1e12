use std::borrow::Cow;

use wgpu::naga::ShaderStage;

/// Compiles the vertex stage: one `vec2` position times the uniform transform.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("line vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(vertex_source()),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Compiles the fragment stage: a flat uniform colour.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("line fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(fragment_source()),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

fn vertex_source() -> String {
    format!("{VERSION}{VERTEX_IO}{LINE_PARAMS_BLOCK}{VERTEX_MAIN}")
}

fn fragment_source() -> String {
    format!("{VERSION}{FRAGMENT_IO}{LINE_PARAMS_BLOCK}{FRAGMENT_MAIN}")
}

const VERSION: &str = "#version 450\n";

/// Shared by both stages; must match `LineUniforms` in `gpu/uniforms.rs`.
const LINE_PARAMS_BLOCK: &str = r"layout(std140, set = 0, binding = 0) uniform LineParams {
    mat4 u_transform;
    vec4 u_color;
} params;
";

const VERTEX_IO: &str = "layout(location = 0) in vec2 a_position;\n";

const VERTEX_MAIN: &str = r"
void main() {
    gl_Position = params.u_transform * vec4(a_position, 0.0, 1.0);
}
";

const FRAGMENT_IO: &str = "layout(location = 0) out vec4 out_color;\n";

const FRAGMENT_MAIN: &str = r"
void main() {
    out_color = vec4(params.u_color.rgb, 1.0);
}
";
