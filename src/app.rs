use std::io;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use glam::{Vec2, Vec3};
use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::camera::PerspectiveCamera;
use crate::config::Config;
use crate::controls::OrbitControls;
use crate::error::FontError;
use crate::font::{self, Font};
use crate::renderer::{Renderer, MAX_PIXEL_RATIO};
use crate::scene::{populate, ObjectKind, Scene, SceneSettings};
use crate::state::{AppState, FrameStats, LoadStatus};
use crate::terminal::{pixels_for_cells, Surface};

const CAMERA_FOV: f32 = 75.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 100.0;
const CAMERA_START: Vec3 = Vec3::new(1.0, 1.0, 2.0);

/// Viewport size in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizes {
    pub width: usize,
    pub height: usize,
}

impl Sizes {
    pub fn from_cells(cols: u16, rows: u16) -> Self {
        let (width, height) = pixels_for_cells(cols, rows);
        Sizes { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Mouse drag in progress
#[derive(Debug, Clone, Copy)]
enum Drag {
    Rotate(Vec2),
    Pan(Vec2),
}

/// The scene, its camera and the frame loop around them.
pub struct App<S: Surface> {
    pub state: AppState,
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub renderer: Renderer,
    pub sizes: Sizes,
    settings: SceneSettings,
    pixel_ratio: f32,
    frame_interval: Duration,
    surface: S,
    font_rx: Option<Receiver<Result<Font, FontError>>>,
    rng: StdRng,
    stats: FrameStats,
    drag: Option<Drag>,
    clock: Instant,
}

impl<S: Surface> App<S> {
    pub fn new(config: &Config, surface: S, sizes: Sizes) -> Self {
        let mut camera = PerspectiveCamera::new(CAMERA_FOV, sizes.aspect(), CAMERA_NEAR, CAMERA_FAR);
        camera.position = CAMERA_START;

        let mut controls = OrbitControls::new(&mut camera, sizes.height as f32);
        controls.enable_damping = true;

        let pixel_ratio = config.pixel_ratio.min(MAX_PIXEL_RATIO);
        let mut renderer = Renderer::new(sizes.width, sizes.height);
        renderer.set_pixel_ratio(pixel_ratio);

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        App {
            state: AppState::default(),
            scene: Scene::default(),
            camera,
            controls,
            renderer,
            sizes,
            settings: config.scene_settings(),
            pixel_ratio,
            frame_interval: config.frame_interval(),
            surface,
            font_rx: None,
            rng,
            stats: FrameStats::new(),
            drag: None,
            clock: Instant::now(),
        }
    }

    /// Starts reading the font in the background
    pub fn load_font(&mut self, config: &Config) {
        info!("loading font {}", config.font.display());
        self.font_rx = Some(font::load_in_background(config.font.clone()));
    }

    fn poll_font(&mut self) {
        let Some(rx) = &self.font_rx else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                error!("Error loading font: loader thread exited");
                self.font_rx = None;
                self.state.load = LoadStatus::Failed("loader thread exited".to_string());
                return;
            }
        };
        self.font_rx = None;
        self.on_font_loaded(result);
    }

    /// Font-load continuation: fills the scene or records the failure
    pub fn on_font_loaded(&mut self, result: Result<Font, FontError>) {
        let font = match result {
            Ok(font) => font,
            Err(err) => {
                error!("Error loading font: {err}");
                self.state.load = LoadStatus::Failed(err.to_string());
                return;
            }
        };

        match populate(&mut self.scene, &font, &self.settings, &mut self.rng) {
            Ok(populated) => {
                self.state.load = LoadStatus::Loaded {
                    donuts: populated.donuts,
                    skipped: populated.skipped,
                };
            }
            Err(err) => {
                error!("Error building text: {err}");
                self.state.load = LoadStatus::Failed(err.to_string());
            }
        }
    }

    pub fn on_resize(&mut self, sizes: Sizes) {
        debug!("resize to {}x{}", sizes.width, sizes.height);
        self.sizes = sizes;

        // Update camera
        self.camera.aspect = sizes.aspect();
        self.camera.update_projection_matrix();
        self.controls.viewport_height = sizes.height as f32;

        // Update renderer
        self.renderer.set_size(sizes.width, sizes.height);
        self.renderer.set_pixel_ratio(self.pixel_ratio);
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Resize(cols, rows) => self.on_resize(Sizes::from_cells(cols, rows)),
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.state.quit = true;
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                self.state.debug = !self.state.debug;
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                self.state.paused = !self.state.paused;
                // Drop any drag that was captured
                self.drag = None;
            }
            KeyCode::Char('w') | KeyCode::Char('W') => {
                self.state.wireframe = !self.state.wireframe;
                self.renderer.wireframe = self.state.wireframe;
            }
            // Camera input is frozen while paused
            _ if self.state.paused => {}
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.controls.reset(&mut self.camera);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.controls.dolly_in(),
            KeyCode::Char('-') => self.controls.dolly_out(),
            KeyCode::Up => {
                let step = self.controls.key_pan_speed;
                self.controls.pan(&self.camera, 0.0, step);
            }
            KeyCode::Down => {
                let step = self.controls.key_pan_speed;
                self.controls.pan(&self.camera, 0.0, -step);
            }
            KeyCode::Left => {
                let step = self.controls.key_pan_speed;
                self.controls.pan(&self.camera, step, 0.0);
            }
            KeyCode::Right => {
                let step = self.controls.key_pan_speed;
                self.controls.pan(&self.camera, -step, 0.0);
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.state.paused {
            return;
        }
        // One cell is two pixels tall
        let pos = Vec2::new(mouse.column as f32, mouse.row as f32 * 2.0);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.drag = Some(Drag::Rotate(pos)),
            MouseEventKind::Down(MouseButton::Right) => self.drag = Some(Drag::Pan(pos)),
            MouseEventKind::Drag(_) => match self.drag {
                Some(Drag::Rotate(last)) => {
                    let delta = pos - last;
                    self.controls.rotate(delta.x, delta.y);
                    self.drag = Some(Drag::Rotate(pos));
                }
                Some(Drag::Pan(last)) => {
                    let delta = pos - last;
                    self.controls.pan(&self.camera, delta.x, delta.y);
                    self.drag = Some(Drag::Pan(pos));
                }
                None => {}
            },
            MouseEventKind::Up(_) => self.drag = None,
            MouseEventKind::ScrollUp => self.controls.dolly_in(),
            MouseEventKind::ScrollDown => self.controls.dolly_out(),
            _ => {}
        }
    }

    fn overlay(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.state.debug {
            lines.push(format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
            let p = self.camera.position;
            lines.push(format!("Camera: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
            lines.push(format!("Distance: {:.2}", self.controls.distance(&self.camera)));
            lines.push(format!(
                "Objects: {} text, {} donuts",
                self.scene.count(ObjectKind::Text),
                self.scene.count(ObjectKind::Donut)
            ));
            let (width, height) = self.renderer.size();
            lines.push(format!(
                "Viewport: {width}x{height} @ {:.1}x",
                self.renderer.pixel_ratio()
            ));
            lines.push(match &self.state.load {
                LoadStatus::Pending => "Font: loading".to_string(),
                LoadStatus::Loaded { donuts, skipped } => {
                    format!("Font: loaded, {donuts} donuts ({skipped} skipped)")
                }
                LoadStatus::Failed(reason) => format!("Font: failed ({reason})"),
            });
            lines.push(format!("FPS: {:.2}", self.stats.fps));
            lines.push(format!("Elapsed: {:.1}s", self.clock.elapsed().as_secs_f32()));
        }
        if self.state.paused {
            lines.push("Paused".to_string());
        }
        lines
    }

    /// One animation frame: font completion, controls, render, present
    pub fn tick(&mut self) -> io::Result<()> {
        self.poll_font();

        if !self.state.paused {
            self.controls.update(&mut self.camera);
        }
        self.renderer.render(&self.scene, &self.camera);
        self.stats.record_frame(Instant::now());

        let frame = self.renderer.frame();
        let overlay = self.overlay();
        self.surface.present(&frame, &overlay)
    }

    /// Runs frames until the user quits, waiting for input between them
    pub fn run(&mut self) -> io::Result<()> {
        info!("starting frame loop at {:?} per frame", self.frame_interval);
        while !self.state.quit {
            let started = Instant::now();
            self.tick()?;

            loop {
                let remaining = self.frame_interval.saturating_sub(started.elapsed());
                if remaining.is_zero() || !event::poll(remaining)? {
                    break;
                }
                self.handle_event(event::read()?);
                if self.state.quit {
                    break;
                }
            }
        }
        info!("quitting after {} frames", self.renderer.render_calls());
        Ok(())
    }
}
