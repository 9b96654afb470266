use std::{ops::Deref, rc::Rc};

use ash::{
    extensions::khr::Surface,
    prelude::VkResult,
    vk::{PhysicalDevice, PresentModeKHR, SurfaceCapabilitiesKHR, SurfaceFormatKHR, SurfaceKHR},
};
use tracing::debug;

use crate::{
    error::{RendererError, RendererResult},
    window::WindowSystem,
};

use super::InstanceGuard;

/// RAII for Surface
pub struct SurfaceGuard {
    surface: Surface,
    surface_ptr: SurfaceKHR,
    // need to keep a reference to instance to ensure we get dropped before it
    _instance: Rc<InstanceGuard>,
}

impl SurfaceGuard {
    pub fn try_new(
        instance: &Rc<InstanceGuard>,
        window: &impl WindowSystem,
    ) -> RendererResult<Self> {
        let surface_ptr = window
            .create_surface(instance.handle())
            .map_err(RendererError::SurfaceCreation)?;
        let surface = Surface::new(instance.entry(), instance);
        debug!("Surface created");
        Ok(Self {
            surface,
            surface_ptr,
            _instance: Rc::clone(instance),
        })
    }

    pub fn get_capabilities(&self, device: PhysicalDevice) -> VkResult<SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface
                .get_physical_device_surface_capabilities(device, self.surface_ptr)
        }
    }

    pub fn get_surface_formats(&self, device: PhysicalDevice) -> VkResult<Vec<SurfaceFormatKHR>> {
        unsafe {
            self.surface
                .get_physical_device_surface_formats(device, self.surface_ptr)
        }
    }

    pub fn get_presentation_modes(&self, device: PhysicalDevice) -> VkResult<Vec<PresentModeKHR>> {
        unsafe {
            self.surface
                .get_physical_device_surface_present_modes(device, self.surface_ptr)
        }
    }

    pub fn get_physical_device_surface_support(
        &self,
        device: PhysicalDevice,
        queue_family_index: u32,
    ) -> VkResult<bool> {
        unsafe {
            self.surface
                .get_physical_device_surface_support(device, queue_family_index, self.surface_ptr)
        }
    }
}

impl Drop for SurfaceGuard {
    fn drop(&mut self) {
        debug!("Dropping SurfaceGuard");
        unsafe { self.surface.destroy_surface(self.surface_ptr, None) }
    }
}

impl Deref for SurfaceGuard {
    type Target = SurfaceKHR;

    fn deref(&self) -> &Self::Target {
        &self.surface_ptr
    }
}
