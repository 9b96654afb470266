use std::{ops::Deref, rc::Rc};

use ash::vk::{
    AccessFlags, AttachmentDescription, AttachmentLoadOp, AttachmentReference, AttachmentStoreOp,
    Format, ImageLayout, PipelineBindPoint, PipelineStageFlags, RenderPass, RenderPassCreateInfo,
    SampleCountFlags, SubpassDependency, SubpassDescription, SUBPASS_EXTERNAL,
};
use tracing::debug;

use crate::{
    error::{RendererError, RendererResult},
    vulkan::LogicalDeviceGuard,
};

pub struct RenderPassGuard {
    render_pass: RenderPass,
    logical_device: Rc<LogicalDeviceGuard>,
}

impl RenderPassGuard {
    pub fn try_new(
        logical_device: &Rc<LogicalDeviceGuard>,
        color_format: Format,
    ) -> RendererResult<Self> {
        debug!("Creating render pass...");

        let attachment_descriptions = [color_attachment(color_format)];

        // not doing any post-processing, so only 1 subpass
        let color_attachment_refs = [AttachmentReference::builder()
            // zero, because we only have 1 attachment description
            .attachment(0)
            .layout(ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .build()];
        let subpasses = [SubpassDescription::builder()
            .pipeline_bind_point(PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_attachment_refs)
            .build()];
        let dependencies = subpass_dependencies();

        let render_pass_create_info = RenderPassCreateInfo::builder()
            .attachments(&attachment_descriptions)
            .subpasses(&subpasses)
            .dependencies(&dependencies);
        let render_pass =
            unsafe { logical_device.create_render_pass(&render_pass_create_info, None) }
                .map_err(RendererError::RenderPassCreation)?;

        debug!("Render pass created");

        Ok(Self {
            render_pass,
            logical_device: Rc::clone(logical_device),
        })
    }
}

/// The single swapchain color attachment: cleared on load, stored, and left
/// ready for presentation.
pub fn color_attachment(format: Format) -> AttachmentDescription {
    AttachmentDescription::builder()
        .format(format)
        // no multi-sampling, so only need 1 sample
        .samples(SampleCountFlags::TYPE_1)
        .load_op(AttachmentLoadOp::CLEAR)
        .store_op(AttachmentStoreOp::STORE)
        // no depth/stencil buffer
        .stencil_load_op(AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(AttachmentStoreOp::DONT_CARE)
        // previous contents are discarded
        .initial_layout(ImageLayout::UNDEFINED)
        .final_layout(ImageLayout::PRESENT_SRC_KHR)
        .build()
}

/// Layout transitions around the one subpass. The first waits for the
/// presentation engine to finish reading before color output writes, the
/// second makes the written image visible to presentation.
pub fn subpass_dependencies() -> [SubpassDependency; 2] {
    let color_access = AccessFlags::COLOR_ATTACHMENT_READ | AccessFlags::COLOR_ATTACHMENT_WRITE;
    [
        SubpassDependency::builder()
            .src_subpass(SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(PipelineStageFlags::BOTTOM_OF_PIPE)
            .src_access_mask(AccessFlags::MEMORY_READ)
            .dst_stage_mask(PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .dst_access_mask(color_access)
            .build(),
        SubpassDependency::builder()
            .src_subpass(0)
            .dst_subpass(SUBPASS_EXTERNAL)
            .src_stage_mask(PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(color_access)
            .dst_stage_mask(PipelineStageFlags::BOTTOM_OF_PIPE)
            .dst_access_mask(AccessFlags::MEMORY_READ)
            .build(),
    ]
}

impl Drop for RenderPassGuard {
    fn drop(&mut self) {
        debug!("Dropping RenderPassGuard");
        unsafe {
            self.logical_device
                .destroy_render_pass(self.render_pass, None)
        }
    }
}

impl Deref for RenderPassGuard {
    type Target = RenderPass;

    fn deref(&self) -> &Self::Target {
        &self.render_pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_is_cleared_and_presented() {
        let attachment = color_attachment(Format::B8G8R8A8_UNORM);
        assert_eq!(attachment.format, Format::B8G8R8A8_UNORM);
        assert_eq!(attachment.samples, SampleCountFlags::TYPE_1);
        assert_eq!(attachment.load_op, AttachmentLoadOp::CLEAR);
        assert_eq!(attachment.store_op, AttachmentStoreOp::STORE);
        assert_eq!(attachment.initial_layout, ImageLayout::UNDEFINED);
        assert_eq!(attachment.final_layout, ImageLayout::PRESENT_SRC_KHR);
    }

    #[test]
    fn dependencies_bracket_the_subpass() {
        let [entry, exit] = subpass_dependencies();

        assert_eq!(entry.src_subpass, SUBPASS_EXTERNAL);
        assert_eq!(entry.dst_subpass, 0);
        assert_eq!(entry.src_stage_mask, PipelineStageFlags::BOTTOM_OF_PIPE);
        assert_eq!(entry.dst_stage_mask, PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);

        assert_eq!(exit.src_subpass, 0);
        assert_eq!(exit.dst_subpass, SUBPASS_EXTERNAL);
        assert_eq!(exit.src_stage_mask, PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);
        assert_eq!(exit.dst_stage_mask, PipelineStageFlags::BOTTOM_OF_PIPE);
    }

    #[test]
    fn dependency_access_masks_mirror_each_other() {
        let [entry, exit] = subpass_dependencies();
        assert_eq!(entry.src_access_mask, AccessFlags::MEMORY_READ);
        assert_eq!(exit.dst_access_mask, AccessFlags::MEMORY_READ);
        assert_eq!(entry.dst_access_mask, exit.src_access_mask);
        assert!(entry
            .dst_access_mask
            .contains(AccessFlags::COLOR_ATTACHMENT_READ | AccessFlags::COLOR_ATTACHMENT_WRITE));
    }
}
