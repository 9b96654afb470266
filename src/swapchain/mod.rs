mod image_view_guard;
mod swap_chain_guard;

use ash::{
    prelude::VkResult,
    vk::{
        ColorSpaceKHR, Extent2D, Format, PhysicalDevice, PresentModeKHR, SharingMode,
        SurfaceCapabilitiesKHR, SurfaceFormatKHR,
    },
};

use crate::{
    error::{RendererError, RendererResult},
    vulkan::{QueueFamilyIndices, SurfaceGuard},
};

pub use self::{image_view_guard::ImageViewGuard, swap_chain_guard::SwapChainGuard};

/// Used when the driver says any format will do
pub const FALLBACK_SURFACE_FORMAT: SurfaceFormatKHR = SurfaceFormatKHR {
    format: Format::R8G8B8A8_UNORM,
    color_space: ColorSpaceKHR::SRGB_NONLINEAR,
};

/// Snapshot of what a surface supports on one physical device
#[derive(Debug, Clone)]
pub struct SwapchainSupport {
    pub capabilities: SurfaceCapabilitiesKHR,
    pub formats: Vec<SurfaceFormatKHR>,
    pub present_modes: Vec<PresentModeKHR>,
}

impl SwapchainSupport {
    /// A swapchain can only be built with at least one format and one mode
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

pub fn query_swap_chain_support(
    surface: &SurfaceGuard,
    device: PhysicalDevice,
) -> VkResult<SwapchainSupport> {
    let capabilities = surface.get_capabilities(device)?;
    let formats = surface.get_surface_formats(device)?;
    let present_modes = surface.get_presentation_modes(device)?;
    Ok(SwapchainSupport {
        capabilities,
        formats,
        present_modes,
    })
}

/// How swapchain images are shared between the queue families using them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSharing {
    Exclusive,
    Concurrent([u32; 2]),
}

impl ImageSharing {
    pub fn for_families(queue_families: &QueueFamilyIndices) -> Self {
        match queue_families.unique_families()[..] {
            [graphics, present] => Self::Concurrent([graphics, present]),
            _ => Self::Exclusive,
        }
    }

    pub fn mode(&self) -> SharingMode {
        match self {
            Self::Exclusive => SharingMode::EXCLUSIVE,
            Self::Concurrent(_) => SharingMode::CONCURRENT,
        }
    }

    pub fn queue_family_indices(&self) -> &[u32] {
        match self {
            Self::Exclusive => &[],
            Self::Concurrent(indices) => indices,
        }
    }
}

/// Everything negotiated for the swapchain before it's created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainPlan {
    pub surface_format: SurfaceFormatKHR,
    pub present_mode: PresentModeKHR,
    pub extent: Extent2D,
    pub image_count: u32,
    pub sharing: ImageSharing,
}

pub fn negotiate(
    support: &SwapchainSupport,
    framebuffer_size: (u32, u32),
    queue_families: &QueueFamilyIndices,
) -> RendererResult<SwapchainPlan> {
    let surface_format = choose_surface_format(&support.formats).ok_or_else(|| {
        RendererError::InvalidState("surface reports no formats".to_owned())
    })?;
    Ok(SwapchainPlan {
        surface_format,
        present_mode: choose_present_mode(&support.present_modes),
        extent: choose_swap_extent(&support.capabilities, framebuffer_size),
        image_count: choose_image_count(&support.capabilities),
        sharing: ImageSharing::for_families(queue_families),
    })
}

/// 8 bit RGBA or BGRA in the non-linear sRGB color space, else the first
/// listed format. A lone `UNDEFINED` entry means there are no restrictions.
pub fn choose_surface_format(formats: &[SurfaceFormatKHR]) -> Option<SurfaceFormatKHR> {
    if let [only] = formats {
        if only.format == Format::UNDEFINED {
            return Some(FALLBACK_SURFACE_FORMAT);
        }
    }
    formats
        .iter()
        .find(|format| {
            matches!(format.format, Format::R8G8B8A8_UNORM | Format::B8G8R8A8_UNORM)
                && format.color_space == ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
        .copied()
}

pub fn choose_present_mode(available_modes: &[PresentModeKHR]) -> PresentModeKHR {
    // mailbox replaces queued images instead of blocking, so it's preferred.
    // fifo is always available
    if available_modes.contains(&PresentModeKHR::MAILBOX) {
        PresentModeKHR::MAILBOX
    } else {
        PresentModeKHR::FIFO
    }
}

/// Uses the surface's current extent when it has one. A width of `u32::MAX`
/// means the surface lets the swapchain decide, so the framebuffer size is
/// clamped into the supported range instead. A driver reporting a minimum
/// above its maximum gets the minimum.
pub fn choose_swap_extent(
    capabilities: &SurfaceCapabilitiesKHR,
    framebuffer_size: (u32, u32),
) -> Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    let (width, height) = framebuffer_size;
    Extent2D {
        width: width
            .min(capabilities.max_image_extent.width)
            .max(capabilities.min_image_extent.width),
        height: height
            .min(capabilities.max_image_extent.height)
            .max(capabilities.min_image_extent.height),
    }
}

/// One more than the minimum, capped by the maximum. A maximum of zero
/// means unbounded.
pub fn choose_image_count(capabilities: &SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        image_count.min(capabilities.max_image_count)
    } else {
        image_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: Format, color_space: ColorSpaceKHR) -> SurfaceFormatKHR {
        SurfaceFormatKHR {
            format,
            color_space,
        }
    }

    fn capabilities(min_image_count: u32, max_image_count: u32) -> SurfaceCapabilitiesKHR {
        SurfaceCapabilitiesKHR {
            min_image_count,
            max_image_count,
            current_extent: Extent2D {
                width: 800,
                height: 600,
            },
            min_image_extent: Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: Extent2D {
                width: 4096,
                height: 4096,
            },
            ..Default::default()
        }
    }

    fn variable_extent(min: (u32, u32), max: (u32, u32)) -> SurfaceCapabilitiesKHR {
        SurfaceCapabilitiesKHR {
            current_extent: Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: Extent2D {
                width: min.0,
                height: min.1,
            },
            max_image_extent: Extent2D {
                width: max.0,
                height: max.1,
            },
            ..capabilities(2, 0)
        }
    }

    #[test]
    fn undefined_format_means_fallback_pair() {
        let formats = [format(Format::UNDEFINED, ColorSpaceKHR::SRGB_NONLINEAR)];
        assert_eq!(choose_surface_format(&formats), Some(FALLBACK_SURFACE_FORMAT));
    }

    #[test]
    fn preferred_pair_is_picked_over_earlier_entries() {
        let formats = [
            format(Format::R16G16B16A16_SFLOAT, ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT),
            format(Format::B8G8R8A8_UNORM, ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        assert_eq!(choose_surface_format(&formats), Some(formats[1]));
    }

    #[test]
    fn preferred_format_needs_srgb_color_space() {
        let formats = [
            format(Format::A2B10G10R10_UNORM_PACK32, ColorSpaceKHR::SRGB_NONLINEAR),
            format(Format::R8G8B8A8_UNORM, ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT),
        ];
        assert_eq!(choose_surface_format(&formats), Some(formats[0]));
    }

    #[test]
    fn no_formats_means_nothing_to_choose() {
        assert_eq!(choose_surface_format(&[]), None);
    }

    #[test]
    fn mailbox_is_preferred() {
        let modes = [PresentModeKHR::FIFO, PresentModeKHR::MAILBOX];
        assert_eq!(choose_present_mode(&modes), PresentModeKHR::MAILBOX);
    }

    #[test]
    fn fifo_without_mailbox() {
        let modes = [PresentModeKHR::IMMEDIATE, PresentModeKHR::FIFO_RELAXED];
        assert_eq!(choose_present_mode(&modes), PresentModeKHR::FIFO);
    }

    #[test]
    fn fixed_extent_is_used_verbatim() {
        let caps = SurfaceCapabilitiesKHR {
            // outside the min/max bounds on purpose, no clamping applies
            current_extent: Extent2D {
                width: 5000,
                height: 600,
            },
            ..capabilities(2, 0)
        };
        assert_eq!(
            choose_swap_extent(&caps, (100, 100)),
            Extent2D {
                width: 5000,
                height: 600
            }
        );
    }

    #[test]
    fn variable_extent_is_clamped_to_bounds() {
        let caps = variable_extent((200, 200), (1024, 768));
        let cases = [
            ((800, 600), (800, 600)),
            ((50, 5000), (200, 768)),
            ((0, 0), (200, 200)),
            ((4000, 300), (1024, 300)),
        ];
        for (framebuffer, expected) in cases {
            let extent = choose_swap_extent(&caps, framebuffer);
            assert_eq!((extent.width, extent.height), expected);
        }
    }

    #[test]
    fn inverted_extent_bounds_resolve_to_the_minimum() {
        let caps = variable_extent((300, 400), (200, 100));
        for framebuffer in [(250, 250), (0, 0), (5000, 5000)] {
            let extent = choose_swap_extent(&caps, framebuffer);
            assert_eq!((extent.width, extent.height), (300, 400), "{framebuffer:?}");
        }
    }

    #[test]
    fn image_count_is_one_more_than_minimum() {
        assert_eq!(choose_image_count(&capabilities(2, 0)), 3);
        assert_eq!(choose_image_count(&capabilities(2, 8)), 3);
    }

    #[test]
    fn image_count_is_capped_by_maximum() {
        assert_eq!(choose_image_count(&capabilities(3, 3)), 3);
        assert_eq!(choose_image_count(&capabilities(1, 1)), 1);
    }

    #[test]
    fn image_count_stays_within_bounds() {
        for min in 1..6 {
            for max in [0, min, min + 1, min + 4] {
                let count = choose_image_count(&capabilities(min, max));
                assert!(count >= min);
                if max > 0 {
                    assert!(count <= max);
                }
            }
        }
    }

    #[test]
    fn shared_family_negotiates_exclusive_sharing() {
        let support = SwapchainSupport {
            capabilities: capabilities(2, 0),
            formats: vec![format(Format::B8G8R8A8_UNORM, ColorSpaceKHR::SRGB_NONLINEAR)],
            present_modes: vec![PresentModeKHR::FIFO],
        };
        let families = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(0),
        };
        let plan = negotiate(&support, (1280, 720), &families).unwrap();
        assert_eq!(
            plan.extent,
            Extent2D {
                width: 800,
                height: 600
            }
        );
        assert_eq!(plan.image_count, 3);
        assert_eq!(plan.sharing, ImageSharing::Exclusive);
        assert_eq!(plan.sharing.mode(), SharingMode::EXCLUSIVE);
        assert!(plan.sharing.queue_family_indices().is_empty());
        assert_eq!(plan.present_mode, PresentModeKHR::FIFO);
    }

    #[test]
    fn split_families_negotiate_concurrent_sharing() {
        let families = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(2),
        };
        let sharing = ImageSharing::for_families(&families);
        assert_eq!(sharing.mode(), SharingMode::CONCURRENT);
        assert_eq!(sharing.queue_family_indices(), &[0, 2]);
    }

    #[test]
    fn negotiation_needs_a_format() {
        let support = SwapchainSupport {
            capabilities: capabilities(2, 0),
            formats: vec![],
            present_modes: vec![PresentModeKHR::FIFO],
        };
        assert!(!support.is_adequate());
        assert!(negotiate(&support, (800, 600), &QueueFamilyIndices::default()).is_err());
    }
}
