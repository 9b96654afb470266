use std::ptr;

use anyhow::{anyhow, Result};
use ash::{prelude::VkResult, vk};
use glfw::{
    fail_on_errors, Action, ClientApiHint, Glfw, GlfwReceiver, Key, PWindow, WindowEvent,
    WindowHint,
};
use tracing::debug;

use crate::config::WindowConfig;

/// What the renderer needs from the host windowing layer. The renderer never
/// keeps hold of the window; it only asks these questions during setup.
pub trait WindowSystem {
    /// Instance extensions the windowing layer needs to create a surface.
    /// None when the windowing layer can't present with Vulkan at all.
    fn required_instance_extensions(&self) -> Option<Vec<String>>;

    /// Creates a presentation surface for this window on `instance`
    fn create_surface(&self, instance: vk::Instance) -> VkResult<vk::SurfaceKHR>;

    /// Current framebuffer size in pixels
    fn framebuffer_size(&self) -> (u32, u32);
}

pub struct WindowManager {
    glfw: Glfw,
    window: PWindow,
    receiver: GlfwReceiver<(f64, WindowEvent)>,
}

impl WindowManager {
    pub fn try_new(config: &WindowConfig) -> Result<Self> {
        let mut glfw = glfw::init(fail_on_errors!())?;
        // vulkan owns presentation, so no GL context. resizing isn't handled
        glfw.window_hint(WindowHint::ClientApi(ClientApiHint::NoApi));
        glfw.window_hint(WindowHint::Resizable(false));

        let (mut window, events) = glfw
            .create_window(
                config.width,
                config.height,
                &config.title,
                glfw::WindowMode::Windowed,
            )
            .ok_or(anyhow!("Failed to create GLFW window"))?;
        window.set_key_polling(true);

        debug!("Window created: {}x{}", config.width, config.height);

        Ok(Self {
            window,
            glfw,
            receiver: events,
        })
    }

    /// Polls window events and calls `on_frame` once per iteration until the
    /// window is closed or `on_frame` fails.
    pub fn run_event_loop(&mut self, mut on_frame: impl FnMut() -> Result<()>) -> Result<()> {
        while !self.window.should_close() {
            self.glfw.poll_events();
            for (_, event) in glfw::flush_messages(&self.receiver) {
                if let WindowEvent::Key(Key::Escape, _, Action::Press, _) = event {
                    self.window.set_should_close(true);
                }
            }
            on_frame()?;
        }
        Ok(())
    }
}

impl WindowSystem for WindowManager {
    fn required_instance_extensions(&self) -> Option<Vec<String>> {
        self.glfw.get_required_instance_extensions()
    }

    fn create_surface(&self, instance: vk::Instance) -> VkResult<vk::SurfaceKHR> {
        let mut surface = vk::SurfaceKHR::null();
        self.window
            .create_window_surface(instance, ptr::null(), &mut surface)
            .result_with_success(surface)
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }
}
