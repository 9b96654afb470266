use std::collections::HashSet;

use ash::{
    prelude::VkResult,
    vk::{PhysicalDevice, QueueFamilyProperties},
};
use tracing::{debug, info};

use crate::{
    error::{RendererError, RendererResult},
    swapchain::{query_swap_chain_support, SwapchainSupport},
};

use super::{
    queue_families::{resolve_queue_families, QueueFamilyIndices},
    validation::{device_extension_names, name_to_string, supports_device_extensions},
    InstanceGuard, SurfaceGuard,
};

/// The driver queries device selection depends on
pub trait DeviceProbe {
    fn enumerate_physical_devices(&self) -> VkResult<Vec<PhysicalDevice>>;

    fn queue_family_properties(&self, device: PhysicalDevice) -> Vec<QueueFamilyProperties>;

    fn supports_present(&self, device: PhysicalDevice, queue_family_index: u32) -> VkResult<bool>;

    fn extension_names(&self, device: PhysicalDevice) -> VkResult<HashSet<String>>;

    fn swapchain_support(&self, device: PhysicalDevice) -> VkResult<SwapchainSupport>;

    fn device_name(&self, device: PhysicalDevice) -> String;
}

/// A physical device as enumerated, with its queue families cached
pub struct PhysicalDeviceCandidate {
    pub handle: PhysicalDevice,
    pub queue_families: Vec<QueueFamilyProperties>,
}

/// The device selection settled on, along with what was learned about it
#[derive(Debug, Clone)]
pub struct SelectedDevice {
    pub physical_device: PhysicalDevice,
    pub queue_families: QueueFamilyIndices,
    pub swapchain_support: SwapchainSupport,
}

pub fn is_suitable(
    queue_families: &QueueFamilyIndices,
    supports_extensions: bool,
    swapchain_support: Option<&SwapchainSupport>,
) -> bool {
    queue_families.is_valid()
        && supports_extensions
        && swapchain_support.map_or(false, SwapchainSupport::is_adequate)
}

/// Checks one candidate. The swapchain is only queried when the swapchain
/// extension is present.
pub fn evaluate_candidate<P: DeviceProbe>(
    probe: &P,
    candidate: &PhysicalDeviceCandidate,
) -> VkResult<Option<SelectedDevice>> {
    let queue_families = resolve_queue_families(&candidate.queue_families, |index| {
        probe.supports_present(candidate.handle, index)
    })?;
    let supports_extensions = supports_device_extensions(&probe.extension_names(candidate.handle)?);
    let swapchain_support = if supports_extensions {
        Some(probe.swapchain_support(candidate.handle)?)
    } else {
        None
    };

    if !is_suitable(&queue_families, supports_extensions, swapchain_support.as_ref()) {
        return Ok(None);
    }

    Ok(swapchain_support.map(|swapchain_support| SelectedDevice {
        physical_device: candidate.handle,
        queue_families,
        swapchain_support,
    }))
}

/// Picks the first suitable device in enumeration order. There is no
/// ranking by device type or memory.
pub fn select_physical_device<P: DeviceProbe>(probe: &P) -> RendererResult<SelectedDevice> {
    let physical_devices = probe
        .enumerate_physical_devices()
        .map_err(RendererError::DeviceQuery)?;
    debug!("Found {} physical device(s)", physical_devices.len());

    for handle in &physical_devices {
        let candidate = PhysicalDeviceCandidate {
            handle: *handle,
            queue_families: probe.queue_family_properties(*handle),
        };
        let name = probe.device_name(*handle);
        match evaluate_candidate(probe, &candidate).map_err(RendererError::DeviceQuery)? {
            Some(selected) => {
                info!("Selected physical device: {}", name);
                debug!("Queue family indices: {:?}", selected.queue_families);
                return Ok(selected);
            }
            None => debug!("Skipping unsuitable physical device: {}", name),
        }
    }

    Err(RendererError::NoCapableDevice {
        enumerated: physical_devices.len(),
    })
}

/// Probe backed by a live instance and surface
pub struct LiveDeviceProbe<'a> {
    instance: &'a InstanceGuard,
    surface: &'a SurfaceGuard,
}

impl<'a> LiveDeviceProbe<'a> {
    pub fn new(instance: &'a InstanceGuard, surface: &'a SurfaceGuard) -> Self {
        Self { instance, surface }
    }
}

impl DeviceProbe for LiveDeviceProbe<'_> {
    fn enumerate_physical_devices(&self) -> VkResult<Vec<PhysicalDevice>> {
        unsafe { self.instance.enumerate_physical_devices() }
    }

    fn queue_family_properties(&self, device: PhysicalDevice) -> Vec<QueueFamilyProperties> {
        unsafe {
            self.instance
                .get_physical_device_queue_family_properties(device)
        }
    }

    fn supports_present(&self, device: PhysicalDevice, queue_family_index: u32) -> VkResult<bool> {
        self.surface
            .get_physical_device_surface_support(device, queue_family_index)
    }

    fn extension_names(&self, device: PhysicalDevice) -> VkResult<HashSet<String>> {
        device_extension_names(self.instance, device)
    }

    fn swapchain_support(&self, device: PhysicalDevice) -> VkResult<SwapchainSupport> {
        query_swap_chain_support(self.surface, device)
    }

    fn device_name(&self, device: PhysicalDevice) -> String {
        let properties = unsafe { self.instance.get_physical_device_properties(device) };
        name_to_string(&properties.device_name)
    }
}

#[cfg(test)]
mod tests {
    use ash::vk::{self, Handle, PresentModeKHR, QueueFlags, SurfaceFormatKHR};

    use super::*;

    #[derive(Clone)]
    struct FakeDevice {
        families: Vec<QueueFamilyProperties>,
        present_families: Vec<u32>,
        extensions: Vec<&'static str>,
        formats: Vec<SurfaceFormatKHR>,
        present_modes: Vec<PresentModeKHR>,
    }

    impl FakeDevice {
        fn capable() -> Self {
            Self {
                families: vec![QueueFamilyProperties {
                    queue_flags: QueueFlags::GRAPHICS,
                    queue_count: 1,
                    ..Default::default()
                }],
                present_families: vec![0],
                extensions: vec!["VK_KHR_swapchain"],
                formats: vec![SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_UNORM,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                }],
                present_modes: vec![PresentModeKHR::FIFO],
            }
        }
    }

    #[derive(Default)]
    struct FakeProbe {
        devices: Vec<FakeDevice>,
        swapchain_queries: std::cell::Cell<usize>,
    }

    impl FakeProbe {
        fn with(devices: Vec<FakeDevice>) -> Self {
            Self {
                devices,
                ..Default::default()
            }
        }

        fn device(&self, handle: PhysicalDevice) -> &FakeDevice {
            &self.devices[handle.as_raw() as usize - 1]
        }
    }

    impl DeviceProbe for FakeProbe {
        fn enumerate_physical_devices(&self) -> VkResult<Vec<PhysicalDevice>> {
            Ok((1..=self.devices.len() as u64)
                .map(PhysicalDevice::from_raw)
                .collect())
        }

        fn queue_family_properties(&self, device: PhysicalDevice) -> Vec<QueueFamilyProperties> {
            self.device(device).families.clone()
        }

        fn supports_present(&self, device: PhysicalDevice, index: u32) -> VkResult<bool> {
            Ok(self.device(device).present_families.contains(&index))
        }

        fn extension_names(&self, device: PhysicalDevice) -> VkResult<HashSet<String>> {
            Ok(self
                .device(device)
                .extensions
                .iter()
                .map(|name| (*name).to_owned())
                .collect())
        }

        fn swapchain_support(&self, device: PhysicalDevice) -> VkResult<SwapchainSupport> {
            self.swapchain_queries.set(self.swapchain_queries.get() + 1);
            let device = self.device(device);
            Ok(SwapchainSupport {
                capabilities: vk::SurfaceCapabilitiesKHR::default(),
                formats: device.formats.clone(),
                present_modes: device.present_modes.clone(),
            })
        }

        fn device_name(&self, device: PhysicalDevice) -> String {
            format!("fake gpu {}", device.as_raw())
        }
    }

    #[test]
    fn zero_devices_is_no_capable_device() {
        let probe = FakeProbe::default();
        let err = select_physical_device(&probe).unwrap_err();
        assert!(matches!(err, RendererError::NoCapableDevice { enumerated: 0 }));
        assert_eq!(probe.swapchain_queries.get(), 0);
    }

    #[test]
    fn first_suitable_device_wins() {
        let probe = FakeProbe::with(vec![FakeDevice::capable(), FakeDevice::capable()]);
        let selected = select_physical_device(&probe).unwrap();
        assert_eq!(selected.physical_device.as_raw(), 1);
        assert_eq!(selected.queue_families.graphics_family, Some(0));
        assert_eq!(selected.queue_families.present_family, Some(0));
    }

    #[test]
    fn each_failed_condition_disqualifies() {
        let no_graphics = FakeDevice {
            families: vec![QueueFamilyProperties {
                queue_flags: QueueFlags::COMPUTE,
                queue_count: 1,
                ..Default::default()
            }],
            ..FakeDevice::capable()
        };
        let no_present = FakeDevice {
            present_families: vec![],
            ..FakeDevice::capable()
        };
        let no_swapchain_extension = FakeDevice {
            extensions: vec!["VK_KHR_maintenance1"],
            ..FakeDevice::capable()
        };
        let no_formats = FakeDevice {
            formats: vec![],
            ..FakeDevice::capable()
        };
        let no_present_modes = FakeDevice {
            present_modes: vec![],
            ..FakeDevice::capable()
        };

        for (label, device) in [
            ("no graphics", no_graphics),
            ("no present", no_present),
            ("no swapchain extension", no_swapchain_extension),
            ("no formats", no_formats),
            ("no present modes", no_present_modes),
        ] {
            let probe = FakeProbe::with(vec![device]);
            let err = select_physical_device(&probe).unwrap_err();
            assert!(
                matches!(err, RendererError::NoCapableDevice { enumerated: 1 }),
                "{label} should not be selected"
            );
        }
    }

    #[test]
    fn unsuitable_devices_are_skipped() {
        let integrated_without_swapchain = FakeDevice {
            extensions: vec![],
            ..FakeDevice::capable()
        };
        let probe = FakeProbe::with(vec![integrated_without_swapchain, FakeDevice::capable()]);
        let selected = select_physical_device(&probe).unwrap();
        assert_eq!(selected.physical_device.as_raw(), 2);
        // swapchain support is only asked for once the extension is known
        assert_eq!(probe.swapchain_queries.get(), 1);
    }

    #[test]
    fn suitability_needs_all_conditions() {
        let valid = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(1),
        };
        let adequate = SwapchainSupport {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: FakeDevice::capable().formats,
            present_modes: vec![PresentModeKHR::FIFO],
        };
        assert!(is_suitable(&valid, true, Some(&adequate)));
        assert!(!is_suitable(&valid, false, Some(&adequate)));
        assert!(!is_suitable(&valid, true, None));
        assert!(!is_suitable(&QueueFamilyIndices::default(), true, Some(&adequate)));
    }
}
