use ash::{
    prelude::VkResult,
    vk::{QueueFamilyProperties, QueueFlags},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// family capable of running graphics related commands
    pub graphics_family: Option<u32>,
    /// family capable of displaying results on the screen
    pub present_family: Option<u32>,
}

impl QueueFamilyIndices {
    /// True once both a graphics and a present family were found
    pub fn is_valid(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }

    /// Distinct family indices, graphics first. One entry when both roles
    /// live on the same family, empty if the indices aren't valid.
    pub fn unique_families(&self) -> Vec<u32> {
        match (self.graphics_family, self.present_family) {
            (Some(graphics), Some(present)) if graphics == present => vec![graphics],
            (Some(graphics), Some(present)) => vec![graphics, present],
            _ => vec![],
        }
    }
}

/// Walks the families in index order and keeps the first one with graphics
/// support and the first one that can present, independently. An index is
/// never replaced once found, and the walk stops as soon as both are known.
/// Families without any queues are skipped.
pub fn resolve_queue_families<F>(
    families: &[QueueFamilyProperties],
    mut supports_present: F,
) -> VkResult<QueueFamilyIndices>
where
    F: FnMut(u32) -> VkResult<bool>,
{
    let mut indices = QueueFamilyIndices::default();
    for (index, family) in (0u32..).zip(families) {
        if family.queue_count == 0 {
            continue;
        }
        if indices.graphics_family.is_none() && family.queue_flags.contains(QueueFlags::GRAPHICS) {
            indices.graphics_family = Some(index);
        }
        if indices.present_family.is_none() && supports_present(index)? {
            indices.present_family = Some(index);
        }
        if indices.is_valid() {
            break;
        }
    }
    Ok(indices)
}
