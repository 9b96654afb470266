use std::path::PathBuf;

use ash::{vk, LoadingError};
use thiserror::Error;

/// Every way bootstrapping the renderer or drawing a frame can fail.
///
/// None of these are recoverable: the renderer is either fully built or the
/// caller gives up.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Failed to load the Vulkan library: {0}")]
    Loader(#[from] LoadingError),

    #[error("The window system cannot present with Vulkan")]
    VulkanUnsupported,

    #[error("Required instance extensions are not available: {}", .0.join(", "))]
    MissingExtensions(Vec<String>),

    #[error("Requested validation layers are not available: {}", .0.join(", "))]
    MissingLayers(Vec<String>),

    #[error("Failed to create a Vulkan instance: {0}")]
    InstanceCreation(vk::Result),

    #[error("Failed to create a window surface: {0}")]
    SurfaceCreation(vk::Result),

    #[error("Failed to query physical device properties: {0}")]
    DeviceQuery(vk::Result),

    #[error("No capable physical device found ({enumerated} enumerated)")]
    NoCapableDevice { enumerated: usize },

    #[error("Failed to create a logical device: {0}")]
    DeviceCreation(vk::Result),

    #[error("Failed to create the swapchain: {0}")]
    SwapchainCreation(vk::Result),

    #[error("Failed to create the render pass: {0}")]
    RenderPassCreation(vk::Result),

    #[error("Failed to load shader {}: {source}", path.display())]
    ShaderLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create the graphics pipeline: {0}")]
    PipelineCreation(vk::Result),

    #[error("Failed to create a framebuffer: {0}")]
    FramebufferCreation(vk::Result),

    #[error("Failed to create the command pool: {0}")]
    CommandPool(vk::Result),

    #[error("Failed to allocate command buffers: {0}")]
    CommandBufferAllocation(vk::Result),

    #[error("Failed to record a command buffer: {0}")]
    Recording(vk::Result),

    #[error("Failed to create synchronization primitives: {0}")]
    SynchronizationCreation(vk::Result),

    #[error("Failed to acquire the next swapchain image: {0}")]
    AcquireImage(vk::Result),

    #[error("Failed to submit the draw command buffer: {0}")]
    Submit(vk::Result),

    #[error("Failed to present the swapchain image: {0}")]
    Present(vk::Result),

    #[error("Renderer reached an invalid state: {0}")]
    InvalidState(String),
}

impl RendererError {
    /// Short name of the stage that failed, for log lines.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Loader(_) => "loader",
            Self::VulkanUnsupported | Self::MissingExtensions(_) | Self::MissingLayers(_) => {
                "validation"
            }
            Self::InstanceCreation(_) => "instance",
            Self::SurfaceCreation(_) => "surface",
            Self::DeviceQuery(_) | Self::NoCapableDevice { .. } => "device selection",
            Self::DeviceCreation(_) => "logical device",
            Self::SwapchainCreation(_) => "swapchain",
            Self::RenderPassCreation(_) => "render pass",
            Self::ShaderLoad { .. } | Self::PipelineCreation(_) => "pipeline",
            Self::FramebufferCreation(_) => "framebuffers",
            Self::CommandPool(_) => "command pool",
            Self::CommandBufferAllocation(_) => "command buffers",
            Self::Recording(_) => "recording",
            Self::SynchronizationCreation(_) => "synchronization",
            Self::AcquireImage(_) => "acquire",
            Self::Submit(_) => "submit",
            Self::Present(_) => "present",
            Self::InvalidState(_) => "state",
        }
    }
}

pub type RendererResult<T> = Result<T, RendererError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_device_message_names_the_stage() {
        let err = RendererError::NoCapableDevice { enumerated: 0 };
        assert_eq!(
            err.to_string(),
            "No capable physical device found (0 enumerated)"
        );
        assert_eq!(err.stage(), "device selection");
    }

    #[test]
    fn missing_extensions_are_listed() {
        let err = RendererError::MissingExtensions(vec![
            "VK_KHR_surface".to_owned(),
            "VK_KHR_xcb_surface".to_owned(),
        ]);
        assert!(err.to_string().ends_with("VK_KHR_surface, VK_KHR_xcb_surface"));
    }

    #[test]
    fn driver_results_are_included() {
        let result = vk::Result::ERROR_OUT_OF_DEVICE_MEMORY;
        let err = RendererError::PipelineCreation(result);
        assert_eq!(
            err.to_string(),
            format!("Failed to create the graphics pipeline: {result}")
        );
        assert_eq!(err.stage(), "pipeline");
    }
}
