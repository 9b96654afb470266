use std::{ops::Deref, rc::Rc};

use ash::vk::{Extent2D, Framebuffer, FramebufferCreateInfo, ImageView};
use tracing::debug;

use crate::{
    error::{RendererError, RendererResult},
    vulkan::LogicalDeviceGuard,
};

use super::RenderPassGuard;

pub struct FramebufferGuard {
    framebuffer: Framebuffer,
    logical_device: Rc<LogicalDeviceGuard>,
}

impl FramebufferGuard {
    pub fn try_new(
        logical_device: &Rc<LogicalDeviceGuard>,
        render_pass: &RenderPassGuard,
        image_view: ImageView,
        extent: Extent2D,
    ) -> RendererResult<Self> {
        let attachments = [image_view];
        let framebuffer_create_info = FramebufferCreateInfo::builder()
            .render_pass(**render_pass)
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);
        let framebuffer =
            unsafe { logical_device.create_framebuffer(&framebuffer_create_info, None) }
                .map_err(RendererError::FramebufferCreation)?;
        Ok(Self {
            framebuffer,
            logical_device: Rc::clone(logical_device),
        })
    }
}

/// One framebuffer per image view, in the same order
pub fn create_framebuffers<V>(
    logical_device: &Rc<LogicalDeviceGuard>,
    render_pass: &RenderPassGuard,
    image_views: &[V],
    extent: Extent2D,
) -> RendererResult<Vec<FramebufferGuard>>
where
    V: Deref<Target = ImageView>,
{
    let framebuffers = image_views
        .iter()
        .map(|image_view| {
            FramebufferGuard::try_new(logical_device, render_pass, **image_view, extent)
        })
        .collect::<RendererResult<Vec<_>>>()?;
    debug!("Created {} framebuffer(s)", framebuffers.len());
    Ok(framebuffers)
}

impl Drop for FramebufferGuard {
    fn drop(&mut self) {
        debug!("Dropping FramebufferGuard");
        unsafe {
            self.logical_device
                .destroy_framebuffer(self.framebuffer, None)
        }
    }
}

impl Deref for FramebufferGuard {
    type Target = Framebuffer;

    fn deref(&self) -> &Self::Target {
        &self.framebuffer
    }
}
