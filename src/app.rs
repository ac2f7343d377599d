use std::fmt;

use anyhow::{anyhow, Result};
use log::{info, warn};
use winit::event::{ElementState, TouchPhase, WindowEvent};

use crate::camera::PerspectiveCamera;
use crate::card::{CardState, TapOutcome};
use crate::config::HEADLESS_FRAME_DT;
use crate::flip::Face;
use crate::render::{CameraParams, LightParams, Renderer};
use crate::viewport::{reconcile, RenderSurface};

/// Measures the time between consecutive frames.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call. The first call returns zero.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(now_seconds())
    }

    pub fn tick_at(&mut self, now: f64) -> f32 {
        let dt = self.last.map_or(0.0, |last| (now - last).max(0.0));
        self.last = Some(now);
        dt as f32
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn now_seconds() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64()
}

#[cfg(target_arch = "wasm32")]
fn now_seconds() -> f64 {
    let millis = web_sys::window()
        .and_then(|window| window.performance())
        .map_or_else(js_sys::Date::now, |performance| performance.now());
    millis / 1000.0
}

/// Whether a window event is a press of any pointer: a mouse button or the
/// start of a touch.
pub fn is_pointer_down(event: &WindowEvent) -> bool {
    match event {
        WindowEvent::MouseInput {
            state: ElementState::Pressed,
            ..
        } => true,
        WindowEvent::Touch(touch) => touch.phase == TouchPhase::Started,
        _ => false,
    }
}

/// Ties the card to a camera, a light and the frame clock. One instance
/// lives inside the event loop of each front end.
pub struct CardApp {
    card: CardState,
    camera: PerspectiveCamera,
    light: LightParams,
    clock: FrameClock,
    reported_not_ready: bool,
}

impl CardApp {
    pub fn new(card: CardState, client: (u32, u32)) -> Self {
        let mut camera = PerspectiveCamera::default();
        if client.1 > 0 {
            camera.aspect = client.0 as f32 / client.1 as f32;
        }
        Self {
            card,
            camera,
            light: LightParams::default(),
            clock: FrameClock::new(),
            reported_not_ready: false,
        }
    }

    pub fn card(&self) -> &CardState {
        &self.card
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// Forwards a pointer press to the card.
    pub fn pointer_down(&mut self) -> TapOutcome {
        let outcome = self.card.tap();
        match outcome {
            TapOutcome::Flipped { page, .. } => info!("showing page {page}"),
            TapOutcome::NotReady if !self.reported_not_ready => {
                info!("card text is unavailable, taps are ignored");
                self.reported_not_ready = true;
            }
            _ => {}
        }
        outcome
    }

    /// Resizes `surface` to the displayed client size and keeps the camera
    /// aspect in step. This is the only place the backing size changes.
    pub fn sync_surface<S>(&mut self, surface: &mut S, client: (u32, u32)) -> bool
    where
        S: RenderSurface + ?Sized,
    {
        reconcile(surface, client, &mut self.camera)
    }

    /// Advances the card by the time since the last frame, keeps the
    /// surface in step with the window and draws.
    pub fn redraw(&mut self, renderer: &mut Renderer, client: (u32, u32)) -> Result<()> {
        let dt = self.clock.tick();
        self.card.update(dt);
        self.sync_surface(renderer, client);
        renderer.update_globals(&CameraParams::from(&self.camera), &self.light);

        match renderer.render(&self.card.draw_list(), self.card.meshes()) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                renderer.reconfigure();
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("GPU is out of memory")),
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; retrying next frame");
                Ok(())
            }
        }
    }
}

/// State of the card after one simulated tap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapReport {
    pub tap: usize,
    pub outcome: TapOutcome,
    pub page: usize,
    pub visible: Face,
    pub angle: f32,
    pub frames: u32,
}

impl fmt::Display for TapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tap {}: ", self.tap)?;
        match self.outcome {
            TapOutcome::NotReady => f.write_str("not ready (no font loaded)")?,
            TapOutcome::Ignored => f.write_str("ignored (flip in progress)")?,
            TapOutcome::Flipped { page, .. } => write!(f, "flipped to page {page}")?,
        }
        write!(
            f,
            " [page {}, visible {}, angle {:.4}, frames {}]",
            self.page,
            self.visible.label(),
            self.angle,
            self.frames
        )
    }
}

/// Taps the card `taps` times without a window. After each tap the card
/// runs `frames_per_tap` frames of `dt` seconds, or until it lands when no
/// frame count is given.
pub fn simulate_taps(
    card: &mut CardState,
    taps: usize,
    frames_per_tap: Option<u32>,
    dt: f32,
) -> Vec<TapReport> {
    let dt = if dt > 0.0 { dt } else { HEADLESS_FRAME_DT };
    (1..=taps)
        .map(|tap| {
            let outcome = card.tap();
            let mut frames = 0;
            match frames_per_tap {
                Some(limit) => {
                    for _ in 0..limit {
                        card.update(dt);
                        frames += 1;
                    }
                }
                None => {
                    while card.phase().is_flipping() {
                        card.update(dt);
                        frames += 1;
                    }
                }
            }
            TapReport {
                tap,
                outcome,
                page: card.page_index(),
                visible: card.visible_face(),
                angle: card.phase().angle(),
                frames,
            }
        })
        .collect()
}
