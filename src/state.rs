use std::time::Instant;

/// Progress of the asynchronous font load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Pending,
    Loaded { donuts: usize, skipped: usize },
    Failed(String),
}

/// Application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Enable debug mode
    pub debug: bool,
    /// Controls frozen
    pub paused: bool,
    /// Wireframe mode enabled
    pub wireframe: bool,
    pub load: LoadStatus,
    /// Set once the user asked to leave
    pub quit: bool,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            debug: false,
            paused: false,
            wireframe: false,
            load: LoadStatus::Pending,
            quit: false,
        }
    }
}

/// Frames-per-second counter, refreshed once a second
#[derive(Debug, Clone)]
pub struct FrameStats {
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    pub fps: f64,
}

impl FrameStats {
    pub fn new() -> Self {
        FrameStats {
            frames_since_last_update: 0,
            last_fps_calculation: Instant::now(),
            fps: 0.0,
        }
    }

    pub fn record_frame(&mut self, now: Instant) {
        self.frames_since_last_update += 1;
        let duration = now.duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }
    }
}
