mod instance_guard;
mod logical_device_guard;
pub mod physical_device;
pub mod queue_families;
mod surface_guard;
pub mod validation;

pub use self::{
    instance_guard::InstanceGuard,
    logical_device_guard::LogicalDeviceGuard,
    physical_device::{select_physical_device, DeviceProbe, LiveDeviceProbe, SelectedDevice},
    queue_families::QueueFamilyIndices,
    surface_guard::SurfaceGuard,
};
