mod framebuffer_guard;
mod graphics_pipeline_guard;
mod render_pass_guard;
mod shader_module_guard;

pub use self::{
    framebuffer_guard::{create_framebuffers, FramebufferGuard},
    graphics_pipeline_guard::{
        color_blend_attachment, full_viewport, rasterization_state, GraphicsPipelineGuard,
    },
    render_pass_guard::{color_attachment, subpass_dependencies, RenderPassGuard},
    shader_module_guard::{load_spirv, ShaderModuleGuard},
};

/// The pipeline only ever renders into the render pass's first subpass
pub const SUBPASS: u32 = 0;
