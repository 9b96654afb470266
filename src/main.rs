use std::{env, process::ExitCode};

use anyhow::{Context, Result};
use tracing::{error, info};
use triangle_bootstrap::{config::DEFAULT_CONFIG_PATH, logging, Config, Renderer, WindowManager};

fn main() -> ExitCode {
    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
    let config = Config::load(&config_path);

    if let Err(err) = logging::init(config.logging.level_filter()) {
        eprintln!("Failed to initialize logging: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<()> {
    // declared first so the renderer is dropped before the window it draws to
    let mut window_manager = WindowManager::try_new(&config.window)?;
    let mut renderer = Renderer::new(&window_manager, &config.renderer)
        .map_err(|err| {
            let stage = err.stage();
            anyhow::Error::new(err).context(format!("Renderer initialization failed at {stage}"))
        })?;

    window_manager.run_event_loop(|| {
        renderer
            .draw_frame()
            .context("Failed to draw frame")
    })?;

    info!("Window closed, shutting down");
    Ok(())
}
