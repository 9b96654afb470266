use std::{ops::Deref, rc::Rc};

use ash::vk::{
    ComponentMapping, ComponentSwizzle, Image, ImageAspectFlags, ImageSubresourceRange, ImageView,
    ImageViewCreateInfo, ImageViewType, SurfaceFormatKHR,
};
use tracing::debug;

use crate::{
    error::{RendererError, RendererResult},
    vulkan::LogicalDeviceGuard,
};

/// RAII for a swapchain image view. The image itself belongs to the swapchain.
pub struct ImageViewGuard {
    view: ImageView,
    logical_device: Rc<LogicalDeviceGuard>,
}

impl ImageViewGuard {
    pub fn try_new(
        image: Image,
        logical_device: &Rc<LogicalDeviceGuard>,
        surface_format: &SurfaceFormatKHR,
    ) -> RendererResult<Self> {
        let image_view_create_info = ImageViewCreateInfo::builder()
            .image(image)
            .view_type(ImageViewType::TYPE_2D)
            .format(surface_format.format)
            .components(ComponentMapping {
                r: ComponentSwizzle::IDENTITY,
                g: ComponentSwizzle::IDENTITY,
                b: ComponentSwizzle::IDENTITY,
                a: ComponentSwizzle::IDENTITY,
            })
            // color target, no mipmapping or layers
            .subresource_range(
                ImageSubresourceRange::builder()
                    .aspect_mask(ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1)
                    .build(),
            );
        let view = unsafe { logical_device.create_image_view(&image_view_create_info, None) }
            .map_err(RendererError::SwapchainCreation)?;
        Ok(Self {
            view,
            logical_device: Rc::clone(logical_device),
        })
    }
}

impl Drop for ImageViewGuard {
    fn drop(&mut self) {
        debug!("Dropping ImageViewGuard");
        unsafe { self.logical_device.destroy_image_view(self.view, None) }
    }
}

impl Deref for ImageViewGuard {
    type Target = ImageView;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}
