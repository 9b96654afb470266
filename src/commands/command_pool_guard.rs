use std::rc::Rc;

use ash::vk::{
    ClearColorValue, ClearValue, CommandBuffer, CommandBufferAllocateInfo, CommandBufferBeginInfo,
    CommandBufferLevel, CommandBufferUsageFlags, CommandPool, CommandPoolCreateFlags,
    CommandPoolCreateInfo, Extent2D, Framebuffer, Offset2D, Pipeline, PipelineBindPoint, Rect2D,
    RenderPass, RenderPassBeginInfo, SubpassContents,
};
use tracing::debug;

use crate::{
    error::{RendererError, RendererResult},
    pipeline::FramebufferGuard,
    vulkan::LogicalDeviceGuard,
};

/// Vertices are generated in the vertex shader from the vertex index
pub const TRIANGLE_VERTEX_COUNT: u32 = 3;

/// What every pre-recorded command buffer draws
#[derive(Debug, Clone, Copy)]
pub struct DrawPass {
    pub render_pass: RenderPass,
    pub pipeline: Pipeline,
    pub extent: Extent2D,
    pub clear_color: [f32; 4],
}

/// RAII for the command pool. Buffers allocated from it are freed with it.
pub struct CommandPoolGuard {
    command_pool: CommandPool,
    logical_device: Rc<LogicalDeviceGuard>,
}

impl CommandPoolGuard {
    pub fn try_new(
        logical_device: &Rc<LogicalDeviceGuard>,
        queue_family_index: u32,
    ) -> RendererResult<Self> {
        debug!("Creating command pool...");

        // buffers are recorded once and never reset individually
        let command_pool_create_info = CommandPoolCreateInfo::builder()
            .flags(CommandPoolCreateFlags::empty())
            .queue_family_index(queue_family_index);
        let command_pool =
            unsafe { logical_device.create_command_pool(&command_pool_create_info, None) }
                .map_err(RendererError::CommandPool)?;

        debug!("Command pool created for queue family {}", queue_family_index);

        Ok(Self {
            command_pool,
            logical_device: Rc::clone(logical_device),
        })
    }

    /// Allocates `count` primary buffers in one call
    pub fn allocate_command_buffers(&self, count: usize) -> RendererResult<Vec<CommandBuffer>> {
        let count = u32::try_from(count).map_err(|_| {
            RendererError::InvalidState(format!("too many command buffers requested: {count}"))
        })?;
        let command_buffer_allocate_info = CommandBufferAllocateInfo::builder()
            .command_pool(self.command_pool)
            .level(CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);
        let command_buffers =
            unsafe { self.logical_device.allocate_command_buffers(&command_buffer_allocate_info) }
                .map_err(RendererError::CommandBufferAllocation)?;
        debug!("Allocated {} command buffer(s)", command_buffers.len());
        Ok(command_buffers)
    }

    /// Records `command_buffers[i]` to draw into `framebuffers[i]`. Buffers
    /// may be resubmitted while still pending, so each is recorded once.
    pub fn record_draw_commands(
        &self,
        command_buffers: &[CommandBuffer],
        framebuffers: &[FramebufferGuard],
        draw_pass: &DrawPass,
    ) -> RendererResult<()> {
        if command_buffers.len() != framebuffers.len() {
            return Err(RendererError::InvalidState(format!(
                "{} command buffers for {} framebuffers",
                command_buffers.len(),
                framebuffers.len()
            )));
        }

        for (command_buffer, framebuffer) in command_buffers.iter().zip(framebuffers) {
            self.record_command_buffer(*command_buffer, **framebuffer, draw_pass)?;
        }

        debug!("Recorded {} command buffer(s)", command_buffers.len());
        Ok(())
    }

    fn record_command_buffer(
        &self,
        command_buffer: CommandBuffer,
        framebuffer: Framebuffer,
        draw_pass: &DrawPass,
    ) -> RendererResult<()> {
        let command_buffer_begin_info =
            CommandBufferBeginInfo::builder().flags(CommandBufferUsageFlags::SIMULTANEOUS_USE);
        unsafe {
            self.logical_device
                .begin_command_buffer(command_buffer, &command_buffer_begin_info)
        }
        .map_err(RendererError::Recording)?;

        let clear_values = [clear_value(draw_pass.clear_color)];
        let render_pass_begin_info = RenderPassBeginInfo::builder()
            .render_pass(draw_pass.render_pass)
            .framebuffer(framebuffer)
            .render_area(Rect2D {
                offset: Offset2D::default(),
                extent: draw_pass.extent,
            })
            .clear_values(&clear_values);
        unsafe {
            self.logical_device.cmd_begin_render_pass(
                command_buffer,
                &render_pass_begin_info,
                SubpassContents::INLINE,
            );
            self.logical_device.cmd_bind_pipeline(
                command_buffer,
                PipelineBindPoint::GRAPHICS,
                draw_pass.pipeline,
            );
            self.logical_device
                .cmd_draw(command_buffer, TRIANGLE_VERTEX_COUNT, 1, 0, 0);
            self.logical_device.cmd_end_render_pass(command_buffer);
            self.logical_device.end_command_buffer(command_buffer)
        }
        .map_err(RendererError::Recording)
    }
}

impl Drop for CommandPoolGuard {
    fn drop(&mut self) {
        debug!("Dropping CommandPoolGuard");
        unsafe {
            self.logical_device
                .destroy_command_pool(self.command_pool, None)
        }
    }
}

#[inline]
pub const fn clear_value(color: [f32; 4]) -> ClearValue {
    ClearValue {
        color: ClearColorValue { float32: color },
    }
}
