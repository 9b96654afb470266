pub mod commands;
pub mod config;
pub mod error;
pub mod frame;
pub mod logging;
pub mod pipeline;
mod renderer;
pub mod swapchain;
pub mod vulkan;
pub mod window;

pub use crate::{
    config::Config,
    error::{RendererError, RendererResult},
    renderer::Renderer,
    window::{WindowManager, WindowSystem},
};
