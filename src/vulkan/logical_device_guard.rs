use std::{ops::Deref, rc::Rc};

use ash::{
    vk::{DeviceCreateInfo, DeviceQueueCreateInfo, PhysicalDeviceFeatures, Queue},
    Device,
};
use tracing::debug;

use crate::error::{RendererError, RendererResult};

use super::{
    physical_device::SelectedDevice, queue_families::QueueFamilyIndices,
    validation::required_device_extensions, InstanceGuard,
};

/// RAII for logical device
pub struct LogicalDeviceGuard {
    device: Device,
    pub graphics_queue_family_index: u32,
    graphics_queue: Queue,
    present_queue: Queue,
    // need to keep a reference to the instance to ensure we get
    // dropped before it does
    instance: Rc<InstanceGuard>,
}

impl LogicalDeviceGuard {
    pub fn try_new(
        instance: &Rc<InstanceGuard>,
        selected: &SelectedDevice,
    ) -> RendererResult<Rc<Self>> {
        debug!("Creating logical device...");

        let QueueFamilyIndices {
            graphics_family: Some(graphics_queue_family_index),
            present_family: Some(present_queue_family_index),
        } = selected.queue_families
        else {
            return Err(RendererError::InvalidState(
                "queue family indices must be valid before creating a device".to_owned(),
            ));
        };

        // one queue per distinct family
        let queue_priorities = [1.0f32];
        let device_queue_create_infos = selected
            .queue_families
            .unique_families()
            .into_iter()
            .map(|queue_family_index| {
                DeviceQueueCreateInfo::builder()
                    .queue_family_index(queue_family_index)
                    .queue_priorities(&queue_priorities)
                    .build()
            })
            .collect::<Vec<_>>();

        let device_extension_name_ptrs = required_device_extensions()
            .into_iter()
            .map(|extension_name| extension_name.as_ptr())
            .collect::<Vec<_>>();

        let physical_device_features = PhysicalDeviceFeatures::default();

        let device_create_info = DeviceCreateInfo::builder()
            .queue_create_infos(&device_queue_create_infos)
            .enabled_features(&physical_device_features)
            .enabled_extension_names(&device_extension_name_ptrs);
        let device = unsafe {
            instance.create_device(selected.physical_device, &device_create_info, None)
        }
        .map_err(RendererError::DeviceCreation)?;

        let graphics_queue = unsafe { device.get_device_queue(graphics_queue_family_index, 0) };
        let present_queue = unsafe { device.get_device_queue(present_queue_family_index, 0) };

        debug!("Logical device created");

        Ok(Rc::new(Self {
            device,
            graphics_queue_family_index,
            graphics_queue,
            present_queue,
            instance: Rc::clone(instance),
        }))
    }

    pub fn graphics_queue(&self) -> Queue {
        self.graphics_queue
    }

    pub fn present_queue(&self) -> Queue {
        self.present_queue
    }

    pub fn instance(&self) -> &Rc<InstanceGuard> {
        &self.instance
    }
}

impl Deref for LogicalDeviceGuard {
    type Target = Device;

    fn deref(&self) -> &Self::Target {
        &self.device
    }
}

impl Drop for LogicalDeviceGuard {
    fn drop(&mut self) {
        debug!("Dropping LogicalDeviceGuard");
        unsafe { self.device.destroy_device(None) }
    }
}
