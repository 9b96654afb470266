use std::{
    collections::HashSet,
    ffi::{c_char, CStr},
};

use ash::{extensions::khr::Swapchain, prelude::VkResult, vk::PhysicalDevice, Entry, Instance};
use tracing::debug;

use crate::error::{RendererError, RendererResult};

pub const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Device extensions a physical device must offer to be selected
pub fn required_device_extensions() -> Vec<&'static CStr> {
    vec![Swapchain::name()]
}

/// Returns the entries of `required` that aren't in `available`, keeping the
/// order they were requested in.
pub fn missing_names<S: AsRef<str>>(required: &[S], available: &HashSet<String>) -> Vec<String> {
    required
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|name| !available.contains(*name))
        .map(str::to_owned)
        .collect()
}

/// Fails with `MissingExtensions` unless every extension in `required` is
/// offered by the instance.
pub fn check_instance_extensions(entry: &Entry, required: &[String]) -> RendererResult<()> {
    let available = unsafe { entry.enumerate_instance_extension_properties(None) }
        .map_err(RendererError::InstanceCreation)?
        .iter()
        .map(|extension| name_to_string(&extension.extension_name))
        .collect::<HashSet<_>>();
    debug!("Available instance extensions: {:?}", available);

    let missing = missing_names(required, &available);
    if !missing.is_empty() {
        return Err(RendererError::MissingExtensions(missing));
    }
    Ok(())
}

/// Fails with `MissingLayers` unless every layer in `requested` is installed.
pub fn check_validation_layers(entry: &Entry, requested: &[&str]) -> RendererResult<()> {
    let available = unsafe { entry.enumerate_instance_layer_properties() }
        .map_err(RendererError::InstanceCreation)?
        .iter()
        .map(|layer| name_to_string(&layer.layer_name))
        .collect::<HashSet<_>>();
    debug!("Available layers: {:?}", available);

    let missing = missing_names(requested, &available);
    if !missing.is_empty() {
        return Err(RendererError::MissingLayers(missing));
    }
    Ok(())
}

pub fn device_extension_names(
    instance: &Instance,
    physical_device: PhysicalDevice,
) -> VkResult<HashSet<String>> {
    let extensions = unsafe { instance.enumerate_device_extension_properties(physical_device) }?;
    Ok(extensions
        .iter()
        .map(|extension| name_to_string(&extension.extension_name))
        .collect())
}

/// True if `available` contains every required device extension
pub fn supports_device_extensions(available: &HashSet<String>) -> bool {
    let required = required_device_extensions()
        .into_iter()
        .map(|name| name.to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    missing_names(&required, available).is_empty()
}

/// Driver-reported names are fixed-size, nul terminated char arrays
pub(crate) fn name_to_string(raw: &[c_char]) -> String {
    unsafe { CStr::from_ptr(raw.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}
