use anyhow::Result;
use log::LevelFilter;
use simple_logger::{set_up_color_terminal, SimpleLogger};

/// Installs the terminal logger. `RUST_LOG` takes precedence over `level`.
pub fn init(level: LevelFilter) -> Result<()> {
    set_up_color_terminal();
    let logger = SimpleLogger::new().with_level(level).env();
    logger.init()?;
    Ok(())
}
