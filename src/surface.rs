//! Presentation surface abstraction.
//!
//! The frame loop never talks to a windowing system directly: it polls input
//! events from and presents frames to a [`PresentationSurface`]. A desktop
//! binding wraps its window type in this trait; [`HeadlessSurface`] runs the
//! full loop without any display, which is how the engine is driven in tests
//! and offline tools.

use std::collections::VecDeque;

use crate::error::DeviceError;
use crate::render::FrameOutput;

/// Dimensions and title of the target surface.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "prism-ngin".to_string(),
            vsync: true,
        }
    }
}

/// Engine-level loop configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub surface: SurfaceConfig,
    /// Length of one simulation step in milliseconds.
    pub tick_duration_millis: u64,
    /// Upper bound on simulation steps per frame. When rendering stalls the
    /// simulation drops time instead of spiraling on catch-up work.
    pub max_ticks_per_frame: u32,
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig::default(),
            tick_duration_millis: 16,
            max_ticks_per_frame: 5,
            fovy_degrees: 45.0,
            znear: 0.1,
            zfar: 500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Input and lifecycle events delivered by the surface, already translated
/// out of whatever the windowing binding uses natively.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    CloseRequested,
    Resized { width: u32, height: u32 },
    Key { code: u32, pressed: bool },
    MouseButton { button: MouseButton, pressed: bool },
    MouseMotion { dx: f64, dy: f64 },
}

/// Where frames go and where input comes from.
pub trait PresentationSurface {
    /// Apply a startup or resize configuration.
    fn configure(&mut self, config: &SurfaceConfig);

    /// Drain all events that arrived since the last poll, in arrival order.
    fn poll_events(&mut self) -> Vec<SurfaceEvent>;

    /// Submit one finished frame.
    ///
    /// [`DeviceError::Lost`] is unrecoverable and stops the frame loop;
    /// [`DeviceError::Surface`] is transient (a resize mid-frame, say) and
    /// the loop skips presentation and carries on.
    fn present(&mut self, frame: &FrameOutput) -> Result<(), DeviceError>;

    fn size(&self) -> (u32, u32);
}

/// Display-less surface: events are queued by the caller, presented frames
/// are counted and the latest one kept for inspection.
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    queued: VecDeque<SurfaceEvent>,
    presented: u64,
    last_frame: Option<FrameOutput>,
    /// When set, a `CloseRequested` is synthesized after this many frames.
    frame_limit: Option<u64>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            queued: VecDeque::new(),
            presented: 0,
            last_frame: None,
            frame_limit: None,
        }
    }

    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Queue an event for the next `poll_events`.
    pub fn push_event(&mut self, event: SurfaceEvent) {
        self.queued.push_back(event);
    }

    pub fn presented_frames(&self) -> u64 {
        self.presented
    }

    pub fn last_frame(&self) -> Option<&FrameOutput> {
        self.last_frame.as_ref()
    }
}

impl PresentationSurface for HeadlessSurface {
    fn configure(&mut self, config: &SurfaceConfig) {
        self.width = config.width;
        self.height = config.height;
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        let mut events: Vec<SurfaceEvent> = self.queued.drain(..).collect();
        if let Some(limit) = self.frame_limit {
            if self.presented >= limit {
                events.push(SurfaceEvent::CloseRequested);
            }
        }
        for event in &events {
            if let SurfaceEvent::Resized { width, height } = *event {
                self.width = width;
                self.height = height;
            }
        }
        events
    }

    fn present(&mut self, frame: &FrameOutput) -> Result<(), DeviceError> {
        self.presented += 1;
        self.last_frame = Some(frame.clone());
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
