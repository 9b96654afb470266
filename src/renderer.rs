use std::rc::Rc;

use ash::{
    vk::{CommandBuffer, Extent2D},
    Entry,
};
use tracing::{debug, info, warn};

use crate::{
    commands::{CommandPoolGuard, DrawPass},
    config::RendererConfig,
    error::{RendererError, RendererResult},
    frame::{
        FrameEvent, FramePhase, FrameSubmission, FrameSynchronizer, SingleFrameInFlight,
        SuboptimalNotice,
    },
    pipeline::{
        create_framebuffers, FramebufferGuard, GraphicsPipelineGuard, RenderPassGuard, SUBPASS,
    },
    swapchain::{self, ImageViewGuard, SwapChainGuard},
    vulkan::{
        select_physical_device,
        validation::{check_instance_extensions, check_validation_layers, VALIDATION_LAYER},
        InstanceGuard, LiveDeviceProbe, LogicalDeviceGuard, SurfaceGuard,
    },
    window::WindowSystem,
};

/// Owns every Vulkan object needed to draw the triangle.
///
/// Fields are declared in reverse creation order so they are released in
/// reverse creation order. If construction fails part way, whatever was
/// already created is released the same way before the error is returned.
pub struct Renderer {
    phase: FramePhase,
    suboptimal: SuboptimalNotice,
    synchronizer: Box<dyn FrameSynchronizer>,
    // freed along with the pool
    command_buffers: Vec<CommandBuffer>,
    _command_pool: CommandPoolGuard,
    framebuffers: Vec<FramebufferGuard>,
    _pipeline: GraphicsPipelineGuard,
    _render_pass: RenderPassGuard,
    image_views: Vec<ImageViewGuard>,
    swapchain: SwapChainGuard,
    logical_device: Rc<LogicalDeviceGuard>,
    _surface: SurfaceGuard,
    _instance: Rc<InstanceGuard>,
}

impl Renderer {
    pub fn new(window: &impl WindowSystem, config: &RendererConfig) -> RendererResult<Self> {
        info!("Initializing renderer...");

        let extension_names = required_extensions(window)?;
        debug!("Required instance extensions: {:?}", extension_names);

        let entry = unsafe { Entry::load() }?;
        check_instance_extensions(&entry, &extension_names)?;

        let layer_names = if config.enable_validation_layers {
            vec![VALIDATION_LAYER]
        } else {
            vec![]
        };
        check_validation_layers(&entry, &layer_names)?;

        let instance = InstanceGuard::try_new(entry, &extension_names, &layer_names)?;
        let surface = SurfaceGuard::try_new(&instance, window)?;

        let selected = select_physical_device(&LiveDeviceProbe::new(&instance, &surface))?;
        let logical_device = LogicalDeviceGuard::try_new(&instance, &selected)?;

        let plan = swapchain::negotiate(
            &selected.swapchain_support,
            window.framebuffer_size(),
            &selected.queue_families,
        )?;
        let swapchain = SwapChainGuard::try_new(
            &logical_device,
            &surface,
            &selected.swapchain_support,
            &plan,
        )?;
        let image_views = swapchain.create_image_views()?;

        let render_pass =
            RenderPassGuard::try_new(&logical_device, swapchain.surface_format.format)?;
        let pipeline = GraphicsPipelineGuard::try_new(
            &logical_device,
            &render_pass,
            SUBPASS,
            swapchain.extent,
            config,
        )?;
        let framebuffers =
            create_framebuffers(&logical_device, &render_pass, &image_views, swapchain.extent)?;

        let command_pool =
            CommandPoolGuard::try_new(&logical_device, logical_device.graphics_queue_family_index)?;
        let command_buffers = command_pool.allocate_command_buffers(framebuffers.len())?;
        command_pool.record_draw_commands(
            &command_buffers,
            &framebuffers,
            &DrawPass {
                render_pass: *render_pass,
                pipeline: *pipeline,
                extent: swapchain.extent,
                clear_color: config.clear_color,
            },
        )?;

        let synchronizer = SingleFrameInFlight::try_new(&logical_device)?;

        let renderer = Self {
            phase: FramePhase::Idle,
            suboptimal: SuboptimalNotice::default(),
            synchronizer: Box::new(synchronizer),
            command_buffers,
            _command_pool: command_pool,
            framebuffers,
            _pipeline: pipeline,
            _render_pass: render_pass,
            image_views,
            swapchain,
            logical_device,
            _surface: surface,
            _instance: instance,
        };
        renderer.check_counts()?;

        info!(
            "Renderer ready: {} swapchain image(s) at {}x{}",
            renderer.image_count(),
            renderer.extent().width,
            renderer.extent().height
        );
        Ok(renderer)
    }

    /// Acquires the next image, submits its pre-recorded command buffer and
    /// presents it. Blocks until an image is available.
    pub fn draw_frame(&mut self) -> RendererResult<()> {
        let signals = self.synchronizer.begin_frame()?;

        self.phase = self.phase.on(FrameEvent::AcquireStarted)?;
        let (image_index, suboptimal) = self
            .swapchain
            .acquire_next_image(signals.image_available)
            .map_err(RendererError::AcquireImage)?;
        self.suboptimal.note("acquire", suboptimal);

        let command_buffer = self
            .command_buffers
            .get(image_index as usize)
            .copied()
            .ok_or_else(|| {
                RendererError::InvalidState(format!(
                    "acquired image {image_index} has no command buffer"
                ))
            })?;

        let submission = FrameSubmission::new(&signals, command_buffer);
        let submit_info = [submission.submit_info()];
        unsafe {
            self.logical_device.queue_submit(
                self.logical_device.graphics_queue(),
                &submit_info,
                signals.in_flight,
            )
        }
        .map_err(RendererError::Submit)?;
        self.phase = self.phase.on(FrameEvent::Submitted { image_index })?;

        self.phase = self.phase.on(FrameEvent::PresentStarted)?;
        let suboptimal = self
            .swapchain
            .queue_present(
                self.logical_device.present_queue(),
                image_index,
                submission.present_wait_semaphores(),
            )
            .map_err(RendererError::Present)?;
        self.suboptimal.note("present", suboptimal);
        self.phase = self.phase.on(FrameEvent::Presented)?;

        self.synchronizer.end_frame();
        Ok(())
    }

    pub fn image_count(&self) -> usize {
        self.swapchain.image_count()
    }

    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn command_buffer_count(&self) -> usize {
        self.command_buffers.len()
    }

    pub fn extent(&self) -> Extent2D {
        self.swapchain.extent
    }

    /// Every swapchain image needs its own view, framebuffer and command buffer
    fn check_counts(&self) -> RendererResult<()> {
        check_resource_counts(
            self.image_count(),
            self.image_views.len(),
            self.framebuffer_count(),
            self.command_buffer_count(),
        )
    }
}

fn required_extensions(window: &impl WindowSystem) -> RendererResult<Vec<String>> {
    window
        .required_instance_extensions()
        .ok_or(RendererError::VulkanUnsupported)
}

fn check_resource_counts(
    images: usize,
    image_views: usize,
    framebuffers: usize,
    command_buffers: usize,
) -> RendererResult<()> {
    if images == image_views && images == framebuffers && images == command_buffers {
        return Ok(());
    }
    Err(RendererError::InvalidState(format!(
        "{images} swapchain images, {image_views} image views, \
         {framebuffers} framebuffers, {command_buffers} command buffers"
    )))
}

impl Drop for Renderer {
    fn drop(&mut self) {
        debug!("Dropping Renderer");
        // nothing may be destroyed while the GPU could still be using it
        if let Err(err) = unsafe { self.logical_device.device_wait_idle() } {
            warn!("Failed to wait for the device to go idle: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use ash::{prelude::VkResult, vk};

    use super::*;

    struct HeadlessWindow {
        extensions: Option<Vec<String>>,
    }

    impl WindowSystem for HeadlessWindow {
        fn required_instance_extensions(&self) -> Option<Vec<String>> {
            self.extensions.clone()
        }

        fn create_surface(&self, _instance: vk::Instance) -> VkResult<vk::SurfaceKHR> {
            Err(vk::Result::ERROR_INITIALIZATION_FAILED)
        }

        fn framebuffer_size(&self) -> (u32, u32) {
            (800, 600)
        }
    }

    #[test]
    fn window_without_vulkan_support_stops_initialization() {
        let window = HeadlessWindow { extensions: None };
        let Err(err) = Renderer::new(&window, &RendererConfig::default()) else {
            panic!("renderer built without window system support");
        };
        assert!(matches!(err, RendererError::VulkanUnsupported));
        assert_eq!(err.stage(), "validation");
    }

    #[test]
    fn window_extensions_are_passed_through() {
        let extensions = vec!["VK_KHR_surface".to_owned(), "VK_KHR_xcb_surface".to_owned()];
        let window = HeadlessWindow {
            extensions: Some(extensions.clone()),
        };
        assert_eq!(required_extensions(&window).unwrap(), extensions);
    }

    #[test]
    fn matching_counts_pass() {
        assert!(check_resource_counts(3, 3, 3, 3).is_ok());
        assert!(check_resource_counts(0, 0, 0, 0).is_ok());
    }

    #[test]
    fn any_mismatch_is_invalid_state() {
        for counts in [(3, 2, 3, 3), (3, 3, 2, 3), (3, 3, 3, 4), (2, 3, 3, 3)] {
            let (images, views, framebuffers, buffers) = counts;
            let err = check_resource_counts(images, views, framebuffers, buffers).unwrap_err();
            assert!(matches!(err, RendererError::InvalidState(_)), "{counts:?}");
        }
    }
}
