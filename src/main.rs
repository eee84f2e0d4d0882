mod aabb;
mod app;
mod camera;
mod config;
mod controls;
mod error;
mod font;
mod graphics;
mod math;
mod mesh;
mod placement;
mod renderer;
mod scene;
mod state;
mod terminal;
mod text;
mod vertex;

use std::fs::File;

use clap::Parser;
use log::info;

use crate::app::{App, Sizes};
use crate::config::Config;
use crate::error::AppError;
use crate::terminal::{viewport_cells, TerminalSurface};

/// Stderr shares the terminal with the frame, so only warnings go there
fn default_filter(config: &Config) -> &'static str {
    if config.log_file.is_some() {
        "info"
    } else {
        "warn"
    }
}

fn init_logging(config: &Config) -> Result<(), AppError> {
    let env = env_logger::Env::default().default_filter_or(default_filter(config));
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(path) = &config.log_file {
        let file = File::create(path).map_err(|source| AppError::LogFile {
            path: path.clone(),
            source,
        })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

pub fn main() -> Result<(), AppError> {
    let config = Config::parse();
    init_logging(&config)?;
    info!(
        "{} {} starting: text {:?}, {} donuts",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.text,
        config.donuts
    );

    let (cols, rows) = viewport_cells();
    let surface = TerminalSurface::new()?;
    let mut app = App::new(&config, surface, Sizes::from_cells(cols, rows));
    app.load_font(&config);
    app.run()?;

    info!("shutdown");
    Ok(())
}
