//! # Dormer
//!
//! First-person walk-around of a small bedroom scene.
//!
//! This binary ties together:
//! - Kernel: glTF loading, animation mixing and the wgpu scene pass
//! - Gameplay: pointer-lock controls, meters, characters and story beats
//! - An egui HUD with the meter bars and a debug overlay
//!
//! Pass `--write-default-config [PATH]` to write the default `dormer.toml`
//! and exit.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod hud;
mod input;
mod renderer;
mod timing;
mod ui;

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EngineConfig;

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("dormer=info".parse()?))
        .init();

    let mut args = std::env::args().skip(1);
    if let Some(flag) = args.next() {
        if flag == "--write-default-config" {
            let path = args.next().map_or_else(|| PathBuf::from("dormer.toml"), PathBuf::from);
            EngineConfig::default()
                .save_to(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            return Ok(());
        }
        anyhow::bail!("Unknown argument: {flag}");
    }

    info!("Dormer starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = EngineConfig::load();
    config.validate();

    app::run(config)?;

    info!("Dormer shutdown complete");
    Ok(())
}
