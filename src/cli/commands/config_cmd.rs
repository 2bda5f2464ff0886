//! config command - Show or change configuration values

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::config::Config;

/// Print the path of the active config file, or where `set` would write.
pub fn path(ctx: &Context) -> Result<()> {
    match ctx.config.source_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("{} (not present)", Config::global_config_path()?.display()),
    }
    Ok(())
}

/// Print every effective value, defaults included.
pub fn list(ctx: &Context) -> Result<()> {
    let config = &ctx.config;
    println!("retry.max_attempts = {}", config.max_attempts());
    println!("retry.max_wait_seconds = {}", config.max_wait_seconds());
    println!("output.verbosity = {}", config.verbosity());
    println!("output.overwrite = {}", config.overwrite());
    Ok(())
}

/// Set a value and write it back to the active config file, or to the
/// global location if none was loaded.
pub fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut file = ctx.config.file.clone();
    file.set_key(key, value)?;

    let written = match ctx.config.source_path() {
        Some(path) => {
            Config::write_to(path, &file).context("Failed to write config")?;
            path.to_path_buf()
        }
        None => Config::write_global(&file).context("Failed to write config")?,
    };

    if ctx.logger.do_info() {
        ctx.logger
            .info(format!("Set {} = {} in {}", key, value, written.display()));
    }
    Ok(())
}
