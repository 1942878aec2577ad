// Frame sequencing driven through recording shaders, no GPU involved.

use glam::{Mat3, Mat4, Vec3};
use winit::keyboard::KeyCode;

use moonbase::controller::{FrameReport, FrameSequencer, FrameTargets, InputEvent, InputState, SceneModels};
use moonbase::model::scene::normal_matrix;
use moonbase::model::{IntroPhase, LightingModel, ManualClock, SceneState, ShadowSettings};
use moonbase::config::LightingConfig;
use moonbase::view::shader::{DrawRecord, PassKind, PassRecord};
use moonbase::view::{PassRecorder, Program, RecordingShader, SharedRecording};

struct Harness {
    sink: SharedRecording,
    passes: PassRecorder,
    depth: RecordingShader,
    lit: RecordingShader,
    sky: RecordingShader,
    models: SceneModels,
    clock: ManualClock,
    scene: SceneState,
    sequencer: FrameSequencer<ManualClock>,
    input: InputState,
}

impl Harness {
    fn new() -> Self {
        let sink = SharedRecording::default();
        let clock = ManualClock::new(100.0);
        Self {
            passes: PassRecorder::new(sink.clone()),
            depth: RecordingShader::new(Program::Depth, sink.clone()),
            lit: RecordingShader::new(Program::Lit, sink.clone()),
            sky: RecordingShader::new(Program::Sky, sink.clone()),
            sink,
            models: SceneModels::outpost(),
            scene: SceneState::new(100.0, ShadowSettings::default()),
            sequencer: FrameSequencer::new(clock.clone()),
            clock,
            input: InputState::new(),
        }
    }

    fn frame(&mut self, dt: f64) -> FrameReport {
        self.clock.tick(dt);
        self.sink.borrow_mut().clear();
        self.sequencer.run_frame(
            &mut self.scene,
            &mut self.input,
            (1920, 1080),
            FrameTargets {
                passes: &mut self.passes,
                depth: &mut self.depth,
                lit: &mut self.lit,
                sky: &mut self.sky,
                models: &self.models,
            },
        )
    }

    fn land(&mut self) {
        self.frame(60.0);
        assert_eq!(self.scene.animation.phase(), IntroPhase::Grounded);
    }

    fn pass(&self, kind: PassKind) -> PassRecord {
        let rec = self.sink.borrow();
        let found = rec.passes.iter().find(|p| p.kind == kind).cloned();
        found.expect("pass recorded")
    }

    fn press(&mut self, key: KeyCode) {
        self.input.process_event(&InputEvent::KeyDown(key));
    }
}

fn object_draws(pass: &PassRecord, program: Program) -> Vec<DrawRecord> {
    pass.draws.iter().filter(|d| d.program == program).cloned().collect()
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn animation_advances_once_per_frame() {
    let mut h = Harness::new();
    h.frame(0.5);
    assert!(approx(h.scene.animation.turret_angle(), 2.5));
    assert!(approx(h.scene.animation.skybox_angle(), 5.15));
    h.frame(0.25);
    assert!(approx(h.scene.animation.turret_angle(), 3.75));
    assert_eq!(h.sequencer.frame_count(), 2);
}

#[test]
fn light_cycle_runs_once_per_frame() {
    let mut h = Harness::new();
    let mut expected = LightingModel::new(LightingConfig::default());
    for _ in 0..10 {
        h.frame(0.016);
        expected.advance_cycle();
    }
    assert_eq!(h.scene.lighting.direction(), expected.direction());
}

#[test]
fn both_passes_see_identical_transforms() {
    let mut h = Harness::new();
    let report = h.frame(0.3);

    let depth = h.pass(PassKind::Depth);
    let lit = h.pass(PassKind::Lit);
    let depth_draws = object_draws(&depth, Program::Depth);
    let lit_draws = object_draws(&lit, Program::Lit);
    assert_eq!(depth_draws.len(), 5);
    assert_eq!(lit_draws.len(), 5);

    for (d, l) in depth_draws.iter().zip(&lit_draws) {
        assert_eq!(d.mesh, l.mesh);
        assert_eq!(d.uniforms.model, l.uniforms.model);
        assert_eq!(d.uniforms.light_space, l.uniforms.light_space);
    }
    let bits = |m: [[f32; 4]; 4]| m.as_flattened().iter().map(|f| f.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(depth_draws[0].uniforms.light_space), bits(report.light_space.to_cols_array_2d()));
    assert_eq!(lit_draws[4].uniforms.model, report.transforms.shuttle.to_cols_array_2d());
}

#[test]
fn draw_lists_keep_capacity_between_frames() {
    let mut h = Harness::new();
    h.frame(0.1);
    let first: Vec<(PassKind, usize)> =
        h.sink.borrow().passes.iter().map(|p| (p.kind, p.draws.capacity())).collect();

    h.frame(0.1);
    let rec = h.sink.borrow();
    assert_eq!(rec.passes.len(), 2);
    for (pass, (kind, capacity)) in rec.passes.iter().zip(&first) {
        assert_eq!(pass.kind, *kind);
        assert_eq!(pass.draws.capacity(), *capacity);
        assert_eq!(pass.draws.len(), 6);
    }
}

#[test]
fn lit_pass_uploads_normal_matrix_per_object() {
    let mut h = Harness::new();
    h.land();
    h.scene.object_yaw = 30.0;
    h.frame(0.1);

    let view = h.scene.camera.view_matrix();
    let lit = h.pass(PassKind::Lit);
    for draw in object_draws(&lit, Program::Lit) {
        let model = Mat4::from_cols_array_2d(&draw.uniforms.model);
        let expected = Mat4::from_mat3(normal_matrix(view, model));
        assert!(Mat4::from_cols_array_2d(&draw.uniforms.normal_matrix).abs_diff_eq(expected, 1e-5));
    }
}

#[test]
fn sky_is_drawn_last_without_translation() {
    let mut h = Harness::new();
    h.frame(0.1);
    let lit = h.pass(PassKind::Lit);
    let last = lit.draws.last().expect("draws");
    assert_eq!(last.program, Program::Sky);
    assert_eq!(&last.uniforms.view[3][..3], &[0.0f32; 3]);
    let rotation = Mat3::from_mat4(h.scene.camera.view_matrix());
    assert!(Mat3::from_mat4(Mat4::from_cols_array_2d(&last.uniforms.view)).abs_diff_eq(rotation, 1e-6));
}

#[test]
fn shadow_map_only_bound_for_lit_pass() {
    let mut h = Harness::new();
    h.frame(0.1);
    let depth = h.pass(PassKind::Depth);
    let lit = h.pass(PassKind::Lit);
    assert_eq!(depth.shadow_map_unit, None);
    assert_eq!(lit.shadow_map_unit, Some(3));
    assert!(object_draws(&lit, Program::Lit).iter().all(|d| d.uniforms.params[2] == 1.0));
    assert!(object_draws(&depth, Program::Depth).iter().all(|d| d.uniforms.params[2] == 0.0));
}

#[test]
fn red_light_follows_intro() {
    let mut h = Harness::new();
    h.frame(0.1);
    let lit = h.pass(PassKind::Lit);
    assert_eq!(object_draws(&lit, Program::Lit)[0].uniforms.params[1], 1.0);

    h.land();
    h.frame(0.1);
    let lit = h.pass(PassKind::Lit);
    assert_eq!(object_draws(&lit, Program::Lit)[0].uniforms.params[1], 0.0);
}

#[test]
fn keyboard_is_ignored_during_intro() {
    let mut h = Harness::new();
    let start = h.scene.camera.position;
    h.press(KeyCode::KeyW);
    h.press(KeyCode::KeyX);
    h.frame(0.1);
    // Only the intro's downward nudge moves the camera
    assert_eq!(h.scene.camera.position.x, start.x);
    assert_eq!(h.scene.camera.position.z, start.z);
    assert!(h.scene.camera.position.y < start.y);
    assert_eq!(h.scene.fog.density(), 0.02);
}

#[test]
fn keyboard_moves_camera_after_landing() {
    let mut h = Harness::new();
    h.land();
    let start = h.scene.camera.position;
    let front = h.scene.camera.front();
    h.press(KeyCode::KeyW);
    h.frame(0.016);
    assert!((h.scene.camera.position - (start + front * 0.1)).length() < 1e-5);
}

#[test]
fn mouse_look_applies_during_intro() {
    let mut h = Harness::new();
    let front = h.scene.camera.front();
    h.input.process_event(&InputEvent::MouseMove { dx: 50.0, dy: 0.0 });
    h.frame(0.016);
    assert!((h.scene.camera.front() - front).length() > 1e-3);
    let c = h.scene.camera.clone();
    assert!((c.target - (c.position + c.front())).length() < 1e-5);
}

#[test]
fn fog_held_for_200_frames_clamps() {
    let mut h = Harness::new();
    h.land();
    h.press(KeyCode::KeyX);
    for _ in 0..200 {
        h.frame(0.016);
        assert!(h.scene.fog.density() <= 0.36);
    }
    assert_eq!(h.scene.fog.density(), 0.36);
    let lit = h.pass(PassKind::Lit);
    assert_eq!(object_draws(&lit, Program::Lit)[0].uniforms.params[0], 0.36);
}

#[test]
fn polygon_mode_reaches_both_passes() {
    let mut h = Harness::new();
    h.land();
    h.press(KeyCode::KeyL);
    h.frame(0.016);
    assert_eq!(h.pass(PassKind::Lit).polygon_mode, moonbase::model::PolygonMode::Line);
    assert_eq!(h.pass(PassKind::Depth).polygon_mode, moonbase::model::PolygonMode::Line);
}

#[test]
fn light_color_tracks_sun_each_frame() {
    let mut h = Harness::new();
    h.land();
    // Push the sun below the horizon
    h.press(KeyCode::KeyC);
    while !h.scene.lighting.is_night() {
        h.frame(0.016);
    }
    let lit = h.pass(PassKind::Lit);
    let colors = h.scene.lighting.colors();
    let uniforms = object_draws(&lit, Program::Lit)[0].uniforms;
    assert_eq!(&uniforms.light_color[..3], &colors.light.to_array());
    assert_eq!(&uniforms.fog_color[..3], &colors.fog.to_array());
    assert!(colors.light.x < 1.0);
    assert_eq!(&uniforms.light_dir[..3], &h.scene.lighting.direction().to_array());
    assert!(Vec3::from_slice(&uniforms.light_dir[..3]).y < 0.0);
}
