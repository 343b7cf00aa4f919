//! Flow control and the main frame loop.
//!
//! A "flow" is a scene or game state that reacts to input, advances its
//! simulation and arranges the scene graph each frame. The engine drives any
//! number of flows through a fixed sequence per frame:
//!
//! 1. poll surface events and distribute them (`on_event`)
//! 2. drain completed background imports (`on_import`)
//! 3. advance the simulation in fixed steps (`on_tick`)
//! 4. run the per-frame update (`on_update`)
//! 5. produce the frame and present it
//!
//! Simulation runs on a fixed timestep with an accumulator, so tick rate is
//! independent of render rate. A stop request completes the frame that is in
//! flight before the loop exits.

use std::collections::{HashSet, VecDeque};

use cgmath::Matrix4;
use instant::{Duration, Instant};

use crate::assets::loader::CompletedImport;
use crate::context::Context;
use crate::error::DeviceError;
use crate::gpu::device::RenderDevice;
use crate::gpu::HeadlessDevice;
use crate::surface::{EngineConfig, MouseButton, PresentationSurface, SurfaceEvent};

/// Input state accumulated from surface events.
///
/// Keys and buttons are level-triggered (held until their release event);
/// the cursor delta accumulates within a frame and resets at the next.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    keys: HashSet<u32>,
    buttons: HashSet<MouseButton>,
    cursor_delta: (f64, f64),
}

impl InputSnapshot {
    pub fn apply(&mut self, event: &SurfaceEvent) {
        match *event {
            SurfaceEvent::Key { code, pressed: true } => {
                self.keys.insert(code);
            }
            SurfaceEvent::Key { code, pressed: false } => {
                self.keys.remove(&code);
            }
            SurfaceEvent::MouseButton { button, pressed: true } => {
                self.buttons.insert(button);
            }
            SurfaceEvent::MouseButton { button, pressed: false } => {
                self.buttons.remove(&button);
            }
            SurfaceEvent::MouseMotion { dx, dy } => {
                self.cursor_delta.0 += dx;
                self.cursor_delta.1 += dy;
            }
            _ => {}
        }
    }

    /// Zero the per-frame accumulators. Held keys and buttons carry over.
    pub fn begin_frame(&mut self) {
        self.cursor_delta = (0.0, 0.0);
    }

    pub fn key_down(&self, code: u32) -> bool {
        self.keys.contains(&code)
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn cursor_delta(&self) -> (f64, f64) {
        self.cursor_delta
    }
}

/// Per-frame snapshot handed to `on_update`: clock, matrices, input.
/// Rebuilt every frame.
#[derive(Debug, Clone)]
pub struct FrameState {
    pub frame: u64,
    pub dt: Duration,
    pub elapsed: Duration,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub input: InputSnapshot,
}

/// Rolling frame-time statistics over the most recent frames.
#[derive(Debug, Clone)]
pub struct FrameMetrics {
    frames: u64,
    window: VecDeque<Duration>,
    capacity: usize,
}

impl FrameMetrics {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: 0,
            window: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.frames += 1;
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(dt);
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn average_frame_time(&self) -> Duration {
        if self.window.is_empty() {
            return Duration::ZERO;
        }
        self.window.iter().sum::<Duration>() / self.window.len() as u32
    }

    pub fn fps(&self) -> f32 {
        let avg = self.average_frame_time().as_secs_f32();
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }
}

impl Default for FrameMetrics {
    fn default() -> Self {
        Self::new(120)
    }
}

/// Fixed-timestep accumulator.
///
/// Frame time is banked and paid out in whole steps. The step count per
/// frame is capped; when a frame arrives so late that the cap is hit, the
/// remaining backlog is dropped rather than carried into a catch-up spiral.
#[derive(Debug, Clone, Copy)]
pub struct FixedStep {
    step: Duration,
    accumulator: Duration,
    max_steps: u32,
}

impl FixedStep {
    pub fn new(step: Duration, max_steps: u32) -> Self {
        Self {
            step,
            accumulator: Duration::ZERO,
            max_steps: max_steps.max(1),
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Bank `dt` and return how many fixed steps to simulate now.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }
        if self.accumulator >= self.step {
            log::warn!(
                "simulation fell {}ms behind, dropping the backlog",
                self.accumulator.as_millis()
            );
            self.accumulator = Duration::ZERO;
        }
        steps
    }
}

/// Trait for a renderable scene or game state.
///
/// Hooks other than `on_init` default to no-ops so a flow only implements
/// what it reacts to.
pub trait Flow<State, D: RenderDevice = HeadlessDevice> {
    /// Called once before the first frame. Load assets, build the scene,
    /// position the camera.
    fn on_init(&mut self, ctx: &mut Context<D>, state: &mut State) -> anyhow::Result<()>;

    /// Called for every surface event, in arrival order.
    fn on_event(&mut self, ctx: &mut Context<D>, state: &mut State, event: &SurfaceEvent) {
        let _ = (ctx, state, event);
    }

    /// Called when a background import requested through `ctx.loader`
    /// finishes. Upload and scene mutation happen here, on the engine thread.
    fn on_import(&mut self, ctx: &mut Context<D>, state: &mut State, import: &CompletedImport) {
        let _ = (ctx, state, import);
    }

    /// Called once per fixed simulation step.
    fn on_tick(&mut self, ctx: &mut Context<D>, state: &mut State) {
        let _ = (ctx, state);
    }

    /// Called once per frame with the frame's clock, matrices and input.
    fn on_update(&mut self, ctx: &mut Context<D>, state: &mut State, frame: &FrameState) {
        let _ = (ctx, state, frame);
    }
}

/// What the loop did before it stopped, plus the final application state.
pub struct RunSummary<State> {
    pub frames: u64,
    pub ticks: u64,
    pub metrics: FrameMetrics,
    pub state: State,
}

/// Drive `flows` against `surface` until a close is requested.
///
/// Fatal device loss aborts with an error; transient surface failures skip
/// presentation for that frame and continue.
pub fn run<State, D, P>(
    config: EngineConfig,
    device: D,
    mut surface: P,
    mut flows: Vec<Box<dyn Flow<State, D>>>,
) -> anyhow::Result<RunSummary<State>>
where
    State: Default,
    D: RenderDevice,
    P: PresentationSurface,
{
    if let Err(e) = env_logger::try_init() {
        log::debug!("logger already initialized: {e}");
    }

    surface.configure(&config.surface);
    let mut ctx = Context::new(&config, device)?;
    let mut state = State::default();
    for flow in &mut flows {
        flow.on_init(&mut ctx, &mut state)?;
    }

    let mut stepper = FixedStep::new(
        Duration::from_millis(config.tick_duration_millis),
        config.max_ticks_per_frame,
    );
    let mut input = InputSnapshot::default();
    let mut metrics = FrameMetrics::default();
    let start_time = Instant::now();
    let mut last_time = start_time;
    let mut frames: u64 = 0;
    let mut total_ticks: u64 = 0;

    loop {
        input.begin_frame();
        let events = surface.poll_events();
        let mut close = false;
        for event in &events {
            input.apply(event);
            match *event {
                SurfaceEvent::CloseRequested => close = true,
                SurfaceEvent::Resized { width, height } => ctx.resize(width, height),
                _ => {}
            }
            for flow in &mut flows {
                flow.on_event(&mut ctx, &mut state, event);
            }
        }
        if close {
            break;
        }

        let imports = ctx.loader.drain_completed();
        for import in &imports {
            for flow in &mut flows {
                flow.on_import(&mut ctx, &mut state, import);
            }
        }

        let now = Instant::now();
        let dt = now - last_time;
        last_time = now;
        let ticks = stepper.advance(dt);
        for _ in 0..ticks {
            for flow in &mut flows {
                flow.on_tick(&mut ctx, &mut state);
            }
        }
        total_ticks += ticks as u64;

        let frame_state = FrameState {
            frame: frames,
            dt,
            elapsed: now - start_time,
            view: ctx.camera.calc_matrix(),
            projection: ctx.projection.calc_matrix(),
            input: input.clone(),
        };
        for flow in &mut flows {
            flow.on_update(&mut ctx, &mut state, &frame_state);
        }

        let output = ctx.render();
        frames += 1;
        metrics.record(dt);
        match surface.present(&output) {
            Ok(()) => {}
            Err(e @ DeviceError::Lost) => return Err(e.into()),
            Err(e @ DeviceError::Surface(_)) => {
                log::error!("skipping presentation this frame: {e}");
            }
        }

        // Checked after render and present: an exit requested mid-frame
        // still yields a complete final frame.
        if ctx.exit_requested {
            break;
        }
    }

    Ok(RunSummary {
        frames,
        ticks: total_ticks,
        metrics,
        state,
    })
}
