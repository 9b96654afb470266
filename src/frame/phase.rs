use crate::error::{RendererError, RendererResult};

/// Where the current frame is in its acquire, submit, present cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    #[default]
    Idle,
    Acquiring,
    Submitted { image_index: u32 },
    Presenting { image_index: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    AcquireStarted,
    Submitted { image_index: u32 },
    PresentStarted,
    Presented,
}

impl FramePhase {
    /// Applies `event`, failing if it can't happen in the current phase
    pub fn on(self, event: FrameEvent) -> RendererResult<Self> {
        match (self, event) {
            (Self::Idle, FrameEvent::AcquireStarted) => Ok(Self::Acquiring),
            (Self::Acquiring, FrameEvent::Submitted { image_index }) => {
                Ok(Self::Submitted { image_index })
            }
            (Self::Submitted { image_index }, FrameEvent::PresentStarted) => {
                Ok(Self::Presenting { image_index })
            }
            (Self::Presenting { .. }, FrameEvent::Presented) => Ok(Self::Idle),
            (phase, event) => Err(RendererError::InvalidState(format!(
                "{event:?} is not valid while the frame is {phase:?}"
            ))),
        }
    }
}
