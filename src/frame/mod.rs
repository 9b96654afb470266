mod phase;
mod semaphore_guard;

use std::{ops::Deref, rc::Rc};

use ash::vk::{CommandBuffer, Fence, PipelineStageFlags, Semaphore, SubmitInfo};
use tracing::{debug, warn};

use crate::{error::RendererResult, vulkan::LogicalDeviceGuard};

pub use self::{
    phase::{FrameEvent, FramePhase},
    semaphore_guard::SemaphoreGuard,
};

/// The primitives one frame waits on and signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSignals {
    /// Signaled by the presentation engine once the acquired image is free
    pub image_available: Semaphore,
    /// Signaled when the frame's commands finish, presentation waits on it
    pub render_finished: Semaphore,
    /// Passed to the submission. Null when nothing waits for the GPU on the CPU.
    pub in_flight: Fence,
}

/// Decides which synchronization primitives each frame uses and how many
/// frames may be queued at once.
pub trait FrameSynchronizer {
    /// Signals for the next frame. Implementations keeping several frames
    /// in flight may block here until one retires.
    fn begin_frame(&mut self) -> RendererResult<FrameSignals>;

    /// Called after the frame was handed to the presentation engine
    fn end_frame(&mut self);
}

/// Everything one frame hands to the graphics queue and to presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSubmission {
    pub wait_semaphores: [Semaphore; 1],
    pub wait_stages: [PipelineStageFlags; 1],
    pub command_buffers: [CommandBuffer; 1],
    pub signal_semaphores: [Semaphore; 1],
}

impl FrameSubmission {
    pub fn new(signals: &FrameSignals, command_buffer: CommandBuffer) -> Self {
        Self {
            wait_semaphores: [signals.image_available],
            // only color output has to wait for the image, earlier stages can
            // run while it's still being acquired
            wait_stages: [PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT],
            command_buffers: [command_buffer],
            signal_semaphores: [signals.render_finished],
        }
    }

    /// Points into `self`, which has to outlive the submission call
    pub fn submit_info(&self) -> SubmitInfo {
        SubmitInfo::builder()
            .wait_semaphores(&self.wait_semaphores)
            .wait_dst_stage_mask(&self.wait_stages)
            .command_buffers(&self.command_buffers)
            .signal_semaphores(&self.signal_semaphores)
            .build()
    }

    /// Presentation waits for the frame's commands to finish
    pub fn present_wait_semaphores(&self) -> &[Semaphore] {
        &self.signal_semaphores
    }
}

/// One semaphore pair shared by every frame. There is no fence, so the CPU
/// never waits for the GPU and nothing bounds how far submission runs ahead.
pub struct SingleFrameInFlight<S = SemaphoreGuard>
where
    S: Deref<Target = Semaphore>,
{
    image_available: S,
    render_finished: S,
    frames_presented: u64,
}

impl SingleFrameInFlight<SemaphoreGuard> {
    pub fn try_new(logical_device: &Rc<LogicalDeviceGuard>) -> RendererResult<Self> {
        let image_available = SemaphoreGuard::try_new(logical_device)?;
        let render_finished = SemaphoreGuard::try_new(logical_device)?;
        debug!("Frame semaphores created");
        Ok(Self::from_semaphores(image_available, render_finished))
    }
}

impl<S> SingleFrameInFlight<S>
where
    S: Deref<Target = Semaphore>,
{
    pub fn from_semaphores(image_available: S, render_finished: S) -> Self {
        Self {
            image_available,
            render_finished,
            frames_presented: 0,
        }
    }
}

impl<S> FrameSynchronizer for SingleFrameInFlight<S>
where
    S: Deref<Target = Semaphore>,
{
    fn begin_frame(&mut self) -> RendererResult<FrameSignals> {
        Ok(FrameSignals {
            image_available: *self.image_available,
            render_finished: *self.render_finished,
            in_flight: Fence::null(),
        })
    }

    fn end_frame(&mut self) {
        self.frames_presented += 1;
    }
}

impl<S> Drop for SingleFrameInFlight<S>
where
    S: Deref<Target = Semaphore>,
{
    fn drop(&mut self) {
        debug!("Dropping SingleFrameInFlight after {} frame(s)", self.frames_presented);
    }
}

/// Warns the first time the swapchain reports it no longer matches the
/// surface. Nothing is recreated, so repeating the warning every frame adds
/// nothing.
#[derive(Debug, Default)]
pub struct SuboptimalNotice {
    reported: bool,
}

impl SuboptimalNotice {
    /// Returns true if this call logged the warning
    pub fn note(&mut self, operation: &str, suboptimal: bool) -> bool {
        if !suboptimal || self.reported {
            return false;
        }
        warn!("Swapchain is suboptimal for the surface after {operation}, continuing anyway");
        self.reported = true;
        true
    }
}
