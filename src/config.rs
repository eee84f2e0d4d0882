use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::scene::SceneSettings;

pub const DEFAULT_FONT: &str = "assets/fonts/blocky.typeface.json";

/// Extruded text surrounded by randomly scattered donuts, drawn in the terminal.
///
/// Drag with the left button to orbit, with the right button to pan, and
/// scroll to zoom. Keys: d debug overlay, p pause, w wireframe, r reset
/// camera, q quit.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    /// Typeface JSON file to set the text in
    #[arg(long, default_value = DEFAULT_FONT)]
    pub font: PathBuf,

    /// Text to extrude
    #[arg(long, default_value = "DONUTS")]
    pub text: String,

    /// Number of donuts to scatter
    #[arg(long, default_value_t = 150)]
    pub donuts: usize,

    /// Seed for a reproducible scene; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Give up on a donut after this many rejected placements; retries forever when omitted
    #[arg(long)]
    pub max_attempts: Option<NonZeroU32>,

    /// Target frames per second
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub fps: u32,

    /// Supersampling factor, clamped to 2
    #[arg(long, default_value_t = 1.0)]
    pub pixel_ratio: f32,

    /// Write log output to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config::parse_from(["donut-scene"])
    }
}

impl Config {
    pub fn scene_settings(&self) -> SceneSettings {
        SceneSettings {
            text: self.text.clone(),
            donuts: self.donuts,
            max_attempts: self.max_attempts,
            ..SceneSettings::default()
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo() {
        let config = Config::default();
        assert_eq!(config.font, PathBuf::from(DEFAULT_FONT));
        assert_eq!(config.text, "DONUTS");
        assert_eq!(config.donuts, 150);
        assert_eq!(config.seed, None);
        assert_eq!(config.max_attempts, None);
        assert_eq!(config.fps, 60);
        assert_eq!(config.pixel_ratio, 1.0);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::parse_from([
            "donut-scene",
            "--text",
            "HELLO",
            "--donuts",
            "20",
            "--seed",
            "9",
            "--max-attempts",
            "1000",
            "--fps",
            "30",
        ]);
        let settings = config.scene_settings();
        assert_eq!(settings.text, "HELLO");
        assert_eq!(settings.donuts, 20);
        assert_eq!(settings.max_attempts, NonZeroU32::new(1000));
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.frame_interval(), Duration::from_secs_f64(1.0 / 30.0));
    }

    #[test]
    fn zero_attempt_cap_is_rejected() {
        assert!(Config::try_parse_from(["donut-scene", "--max-attempts", "0"]).is_err());
        assert!(Config::try_parse_from(["donut-scene", "--fps", "0"]).is_err());
    }

    #[test]
    fn command_is_well_formed() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
