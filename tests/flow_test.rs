use std::time::Duration;

use prism_ngin::context::Context;
use prism_ngin::flow::{run, FixedStep, Flow, FrameState, InputSnapshot};
use prism_ngin::gpu::{HeadlessDevice, MaterialParam};
use prism_ngin::surface::{EngineConfig, HeadlessSurface, MouseButton, SurfaceEvent};

use crate::common::test_utils::{flat_material, quad};

mod common;

#[test]
fn fixed_step_pays_out_whole_steps() {
    let mut stepper = FixedStep::new(Duration::from_millis(10), 5);

    assert_eq!(stepper.advance(Duration::from_millis(4)), 0);
    // 4ms banked + 21ms = 25ms: two steps, 5ms stays banked.
    assert_eq!(stepper.advance(Duration::from_millis(21)), 2);
    assert_eq!(stepper.advance(Duration::from_millis(5)), 1);
    assert_eq!(stepper.advance(Duration::ZERO), 0);
}

#[test]
fn fixed_step_caps_catch_up_and_drops_the_backlog() {
    let mut stepper = FixedStep::new(Duration::from_millis(10), 5);

    // A 120ms stall would owe 12 steps; the cap pays 5 and drops the rest.
    assert_eq!(stepper.advance(Duration::from_millis(120)), 5);
    // The dropped backlog does not leak into the next frame.
    assert_eq!(stepper.advance(Duration::from_millis(9)), 0);
    assert_eq!(stepper.advance(Duration::from_millis(1)), 1);
}

#[test]
fn input_snapshot_tracks_held_state_and_per_frame_deltas() {
    let mut input = InputSnapshot::default();

    input.apply(&SurfaceEvent::Key {
        code: 17,
        pressed: true,
    });
    input.apply(&SurfaceEvent::MouseButton {
        button: MouseButton::Left,
        pressed: true,
    });
    input.apply(&SurfaceEvent::MouseMotion { dx: 3.0, dy: -1.0 });
    input.apply(&SurfaceEvent::MouseMotion { dx: 2.0, dy: 0.5 });

    assert!(input.key_down(17));
    assert!(input.button_down(MouseButton::Left));
    assert_eq!(input.cursor_delta(), (5.0, -0.5));

    // A new frame resets deltas but keeps held keys and buttons.
    input.begin_frame();
    assert_eq!(input.cursor_delta(), (0.0, 0.0));
    assert!(input.key_down(17));

    input.apply(&SurfaceEvent::Key {
        code: 17,
        pressed: false,
    });
    assert!(!input.key_down(17));
}

#[derive(Default)]
struct Counters {
    inits: u32,
    updates: u32,
    events: Vec<SurfaceEvent>,
}

struct CountingFlow;

impl Flow<Counters> for CountingFlow {
    fn on_init(
        &mut self,
        ctx: &mut Context<HeadlessDevice>,
        state: &mut Counters,
    ) -> anyhow::Result<()> {
        // Give the loop something real to draw.
        let mesh = ctx.resources.upload_mesh(&quad("loop-quad"))?;
        let material = ctx.resources.create_material(flat_material("plain"))?;
        let node = ctx.scene.add_root();
        ctx.scene
            .set_renderable(node, Some((mesh, material)))
            .map_err(anyhow::Error::from)?;
        state.inits += 1;
        Ok(())
    }

    fn on_event(
        &mut self,
        _ctx: &mut Context<HeadlessDevice>,
        state: &mut Counters,
        event: &SurfaceEvent,
    ) {
        state.events.push(event.clone());
    }

    fn on_update(
        &mut self,
        _ctx: &mut Context<HeadlessDevice>,
        state: &mut Counters,
        frame: &FrameState,
    ) {
        assert_eq!(frame.frame, state.updates as u64);
        state.updates += 1;
    }
}

#[test]
fn loop_runs_until_the_surface_closes() {
    let surface = HeadlessSurface::new(320, 240).with_frame_limit(3);
    let summary = run(
        EngineConfig::default(),
        HeadlessDevice::new(),
        surface,
        vec![Box::new(CountingFlow) as Box<dyn Flow<Counters>>],
    )
    .unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.metrics.frames(), 3);
    assert_eq!(summary.state.inits, 1);
    assert_eq!(summary.state.updates, 3);
    // The synthesized close was distributed like any other event.
    assert!(summary
        .state
        .events
        .contains(&SurfaceEvent::CloseRequested));
}

struct ExitAfterFirstUpdate;

impl Flow<Counters> for ExitAfterFirstUpdate {
    fn on_init(
        &mut self,
        _ctx: &mut Context<HeadlessDevice>,
        state: &mut Counters,
    ) -> anyhow::Result<()> {
        state.inits += 1;
        Ok(())
    }

    fn on_update(
        &mut self,
        ctx: &mut Context<HeadlessDevice>,
        state: &mut Counters,
        _frame: &FrameState,
    ) {
        state.updates += 1;
        ctx.request_exit();
    }
}

#[test]
fn exit_request_still_completes_the_current_frame() {
    let surface = HeadlessSurface::new(320, 240).with_frame_limit(100);
    let summary = run(
        EngineConfig::default(),
        HeadlessDevice::new(),
        surface,
        vec![Box::new(ExitAfterFirstUpdate) as Box<dyn Flow<Counters>>],
    )
    .unwrap();

    // The exit was requested during frame one; that frame still rendered
    // and was presented before the loop stopped.
    assert_eq!(summary.frames, 1);
    assert_eq!(summary.state.updates, 1);
}

#[test]
fn queued_resize_reaches_the_projection_and_flows() {
    let mut surface = HeadlessSurface::new(320, 240).with_frame_limit(1);
    surface.push_event(SurfaceEvent::Resized {
        width: 1024,
        height: 512,
    });

    let summary = run(
        EngineConfig::default(),
        HeadlessDevice::new(),
        surface,
        vec![Box::new(CountingFlow) as Box<dyn Flow<Counters>>],
    )
    .unwrap();

    assert!(summary.state.events.iter().any(|e| matches!(
        e,
        SurfaceEvent::Resized {
            width: 1024,
            height: 512
        }
    )));
}

#[test]
fn material_params_survive_the_context_round_trip() {
    let config = EngineConfig::default();
    let mut ctx: Context<HeadlessDevice> =
        Context::new(&config, HeadlessDevice::new()).unwrap();

    let handle = ctx
        .resources
        .create_material(flat_material("tweakable").with("glow", MaterialParam::Scalar(0.0)))
        .unwrap();
    ctx.resources
        .material_mut(handle)
        .unwrap()
        .set("glow", MaterialParam::Scalar(2.5));

    assert_eq!(
        ctx.resources.material(handle).unwrap().scalar("glow"),
        Some(2.5)
    );
}
