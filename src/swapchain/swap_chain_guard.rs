use std::rc::Rc;

use ash::{
    extensions::khr::Swapchain,
    prelude::VkResult,
    vk::{
        CompositeAlphaFlagsKHR, Extent2D, Fence, Image, ImageUsageFlags, PresentInfoKHR, Queue,
        Semaphore, SurfaceFormatKHR, SwapchainCreateInfoKHR, SwapchainKHR,
    },
};
use tracing::{debug, info};

use crate::{
    error::{RendererError, RendererResult},
    vulkan::{LogicalDeviceGuard, SurfaceGuard},
};

use super::{ImageViewGuard, SwapchainPlan, SwapchainSupport};

/// RAII for the swapchain. Image views are handed out separately so their
/// owner can release them before the swapchain goes.
pub struct SwapChainGuard {
    handle: SwapchainKHR,
    swapchain: Swapchain,
    images: Vec<Image>,
    pub extent: Extent2D,
    pub surface_format: SurfaceFormatKHR,
    logical_device: Rc<LogicalDeviceGuard>,
}

impl SwapChainGuard {
    pub fn try_new(
        logical_device: &Rc<LogicalDeviceGuard>,
        surface: &SurfaceGuard,
        support: &SwapchainSupport,
        plan: &SwapchainPlan,
    ) -> RendererResult<Self> {
        info!(
            "Creating swapchain: {:?} {:?}, {:?}, {}x{}, {} image(s), {:?}",
            plan.surface_format.format,
            plan.surface_format.color_space,
            plan.present_mode,
            plan.extent.width,
            plan.extent.height,
            plan.image_count,
            plan.sharing.mode()
        );

        let swap_chain_creation_info = SwapchainCreateInfoKHR::builder()
            .surface(**surface)
            .min_image_count(plan.image_count)
            .image_format(plan.surface_format.format)
            .image_color_space(plan.surface_format.color_space)
            .image_extent(plan.extent)
            // not doing sterioscopic processing, only need 1 layer
            .image_array_layers(1)
            // we're rendering images, so set usage as a color attachment
            .image_usage(ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(plan.sharing.mode())
            .queue_family_indices(plan.sharing.queue_family_indices())
            // no extra transforms, just pass in current transform
            .pre_transform(support.capabilities.current_transform)
            // ignore alpha channel
            .composite_alpha(CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(plan.present_mode)
            // discard pixels hidden by something else (like another window)
            .clipped(true)
            .old_swapchain(SwapchainKHR::null());

        let swapchain = Swapchain::new(logical_device.instance(), logical_device);
        let handle = unsafe { swapchain.create_swapchain(&swap_chain_creation_info, None) }
            .map_err(RendererError::SwapchainCreation)?;

        let images = match unsafe { swapchain.get_swapchain_images(handle) } {
            Ok(images) => images,
            Err(err) => {
                unsafe { swapchain.destroy_swapchain(handle, None) };
                return Err(RendererError::SwapchainCreation(err));
            }
        };
        debug!("Swapchain created with {} image(s)", images.len());

        Ok(Self {
            handle,
            swapchain,
            images,
            extent: plan.extent,
            surface_format: plan.surface_format,
            logical_device: Rc::clone(logical_device),
        })
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// One color view per swapchain image, in image order
    pub fn create_image_views(&self) -> RendererResult<Vec<ImageViewGuard>> {
        self.images
            .iter()
            .map(|image| {
                ImageViewGuard::try_new(*image, &self.logical_device, &self.surface_format)
            })
            .collect()
    }

    /// Waits without a timeout. The flag is true when the swapchain no
    /// longer matches the surface exactly.
    pub fn acquire_next_image(&self, signal_semaphore: Semaphore) -> VkResult<(u32, bool)> {
        unsafe {
            self.swapchain
                .acquire_next_image(self.handle, u64::MAX, signal_semaphore, Fence::null())
        }
    }

    /// Queues `image_index` for presentation once `wait_semaphores` are
    /// signaled. Returns the suboptimal flag.
    pub fn queue_present(
        &self,
        queue: Queue,
        image_index: u32,
        wait_semaphores: &[Semaphore],
    ) -> VkResult<bool> {
        let swapchains = [self.handle];
        let image_indices = [image_index];
        let present_info = PresentInfoKHR::builder()
            .wait_semaphores(wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);
        unsafe { self.swapchain.queue_present(queue, &present_info) }
    }
}

impl Drop for SwapChainGuard {
    fn drop(&mut self) {
        debug!("Dropping SwapChainGuard");
        unsafe { self.swapchain.destroy_swapchain(self.handle, None) }
    }
}
