use std::{ffi::CStr, ops::Deref, rc::Rc};

use ash::vk::{
    BlendFactor, BlendOp, ColorComponentFlags, CullModeFlags, Extent2D, FrontFace,
    GraphicsPipelineCreateInfo, Offset2D, Pipeline, PipelineCache,
    PipelineColorBlendAttachmentState, PipelineColorBlendStateCreateInfo,
    PipelineInputAssemblyStateCreateInfo, PipelineLayout, PipelineLayoutCreateInfo,
    PipelineMultisampleStateCreateInfo, PipelineRasterizationStateCreateInfo,
    PipelineShaderStageCreateInfo, PipelineVertexInputStateCreateInfo,
    PipelineViewportStateCreateInfo, PolygonMode, PrimitiveTopology, Rect2D, SampleCountFlags,
    ShaderStageFlags, Viewport,
};
use tracing::debug;

use crate::{
    config::RendererConfig,
    error::{RendererError, RendererResult},
    vulkan::LogicalDeviceGuard,
};

use super::{RenderPassGuard, ShaderModuleGuard};

const ENTRY_POINT: &CStr = c"main";

/// RAII for the graphics pipeline and its (empty) layout
pub struct GraphicsPipelineGuard {
    pipeline: Pipeline,
    pipeline_layout: PipelineLayout,
    logical_device: Rc<LogicalDeviceGuard>,
}

impl GraphicsPipelineGuard {
    pub fn try_new(
        logical_device: &Rc<LogicalDeviceGuard>,
        render_pass: &RenderPassGuard,
        subpass: u32,
        extent: Extent2D,
        config: &RendererConfig,
    ) -> RendererResult<Self> {
        debug!("Creating graphics pipeline...");

        // modules are only needed until the pipeline is built
        let vertex_shader_module =
            ShaderModuleGuard::try_new(&config.vertex_shader, logical_device)?;
        let fragment_shader_module =
            ShaderModuleGuard::try_new(&config.fragment_shader, logical_device)?;
        let shader_stages = [
            PipelineShaderStageCreateInfo::builder()
                .stage(ShaderStageFlags::VERTEX)
                .module(*vertex_shader_module)
                .name(ENTRY_POINT)
                .build(),
            PipelineShaderStageCreateInfo::builder()
                .stage(ShaderStageFlags::FRAGMENT)
                .module(*fragment_shader_module)
                .name(ENTRY_POINT)
                .build(),
        ];

        // vertices come from the shader itself, no buffers are bound
        let vertex_input_state = PipelineVertexInputStateCreateInfo::builder();

        let input_assembly_state = PipelineInputAssemblyStateCreateInfo::builder()
            .topology(PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewports = [full_viewport(extent)];
        let scissors = [Rect2D {
            offset: Offset2D { x: 0, y: 0 },
            extent,
        }];
        let viewport_state = PipelineViewportStateCreateInfo::builder()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization_state = rasterization_state();

        let multisample_state = PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(SampleCountFlags::TYPE_1);

        let color_blend_attachments = [color_blend_attachment()];
        let color_blend_state = PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        // no descriptor sets or push constants
        let pipeline_layout_info = PipelineLayoutCreateInfo::builder();
        let pipeline_layout =
            unsafe { logical_device.create_pipeline_layout(&pipeline_layout_info, None) }
                .map_err(RendererError::PipelineCreation)?;

        let pipeline_create_infos = [GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .layout(pipeline_layout)
            .render_pass(**render_pass)
            .subpass(subpass)
            .build()];

        let pipelines = unsafe {
            logical_device.create_graphics_pipelines(
                PipelineCache::null(),
                &pipeline_create_infos,
                None,
            )
        };
        let pipeline = match pipelines {
            Ok(pipelines) => pipelines.into_iter().next(),
            Err((_, err)) => {
                unsafe { logical_device.destroy_pipeline_layout(pipeline_layout, None) };
                return Err(RendererError::PipelineCreation(err));
            }
        };
        let Some(pipeline) = pipeline else {
            unsafe { logical_device.destroy_pipeline_layout(pipeline_layout, None) };
            return Err(RendererError::InvalidState(
                "driver returned no graphics pipeline".to_owned(),
            ));
        };

        debug!("Graphics pipeline created");

        Ok(Self {
            pipeline,
            pipeline_layout,
            logical_device: Rc::clone(logical_device),
        })
    }
}

/// Covers the whole extent with the standard depth range
pub fn full_viewport(extent: Extent2D) -> Viewport {
    Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

/// Filled polygons, back faces culled, clockwise winding is front facing
pub fn rasterization_state() -> PipelineRasterizationStateCreateInfo {
    PipelineRasterizationStateCreateInfo::builder()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(PolygonMode::FILL)
        .line_width(1.0)
        .cull_mode(CullModeFlags::BACK)
        .front_face(FrontFace::CLOCKWISE)
        .depth_bias_enable(false)
        .build()
}

/// Standard alpha blending on color, alpha passed through from the source
pub fn color_blend_attachment() -> PipelineColorBlendAttachmentState {
    PipelineColorBlendAttachmentState::builder()
        .blend_enable(true)
        .src_color_blend_factor(BlendFactor::SRC_ALPHA)
        .dst_color_blend_factor(BlendFactor::ONE_MINUS_SRC_ALPHA)
        .color_blend_op(BlendOp::ADD)
        .src_alpha_blend_factor(BlendFactor::ONE)
        .dst_alpha_blend_factor(BlendFactor::ZERO)
        .alpha_blend_op(BlendOp::ADD)
        .color_write_mask(ColorComponentFlags::RGBA)
        .build()
}

impl Drop for GraphicsPipelineGuard {
    fn drop(&mut self) {
        debug!("Dropping GraphicsPipelineGuard");
        unsafe {
            self.logical_device.destroy_pipeline(self.pipeline, None);
            self.logical_device
                .destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}

impl Deref for GraphicsPipelineGuard {
    type Target = Pipeline;

    fn deref(&self) -> &Self::Target {
        &self.pipeline
    }
}
