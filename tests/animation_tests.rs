// Time-stepping properties of the intro and the continuous rotations.

use glam::Vec3;

use moonbase::config::{AnimationConfig, LightingConfig, CAMERA_START_POSITION, CAMERA_START_TARGET};
use moonbase::model::{AnimationState, Camera, IntroPhase, LightingModel};

fn camera() -> Camera {
    Camera::new(CAMERA_START_POSITION, CAMERA_START_TARGET, Vec3::Y)
}

fn fresh() -> (AnimationState, Camera) {
    (AnimationState::new(AnimationConfig::default(), 0.0), camera())
}

#[test]
fn fine_steps_match_one_coarse_step_away_from_thresholds() {
    let (mut fine, mut fine_cam) = fresh();
    let (mut coarse, mut coarse_cam) = fresh();

    for _ in 0..100 {
        fine.step(0.01, &mut fine_cam);
    }
    coarse.step(1.0, &mut coarse_cam);

    assert!((fine.turret_angle() - coarse.turret_angle()).abs() < 1e-3);
    assert!((fine.skybox_angle() - coarse.skybox_angle()).abs() < 1e-3);
    assert!((fine.shuttle_elevation() - coarse.shuttle_elevation()).abs() < 1e-3);
    assert!((coarse.shuttle_elevation() - 4.7).abs() < 1e-5);
}

#[test]
fn camera_nudge_depends_on_call_count() {
    let (mut fine, mut fine_cam) = fresh();
    let (mut coarse, mut coarse_cam) = fresh();
    for _ in 0..100 {
        fine.step(0.01, &mut fine_cam);
    }
    coarse.step(1.0, &mut coarse_cam);

    let drop_fine = CAMERA_START_POSITION.y - fine_cam.position.y;
    let drop_coarse = CAMERA_START_POSITION.y - coarse_cam.position.y;
    assert!((drop_fine - 100.0 * 0.3 / 290.0).abs() < 1e-4);
    assert!((drop_coarse - 0.3 / 290.0).abs() < 1e-6);
}

#[test]
fn coarse_and_fine_steps_diverge_across_the_approach_threshold() {
    let (mut fine, mut fine_cam) = fresh();
    let (mut coarse, mut coarse_cam) = fresh();

    for _ in 0..1100 {
        fine.step(0.01, &mut fine_cam);
    }
    coarse.step(11.0, &mut coarse_cam);

    // Fine: 10 s at 0.3 reaches the threshold, then 1 s at 0.2
    assert!((fine.shuttle_elevation() - 1.8).abs() < 0.01);
    // Coarse: the whole 11 s at 0.3, slowing only afterwards
    assert!((coarse.shuttle_elevation() - 1.7).abs() < 1e-4);
    assert!((fine.shuttle_speed() - 0.2).abs() < 1e-6);
    assert!((coarse.shuttle_speed() - 0.2).abs() < 1e-6);
}

#[test]
fn coarse_step_can_skip_the_deceleration() {
    let (mut coarse, mut cam) = fresh();
    coarse.step(20.0, &mut cam);
    assert_eq!(coarse.phase(), IntroPhase::Grounded);
    assert_eq!(coarse.shuttle_speed(), AnimationConfig::default().shuttle_start_speed);
}

#[test]
fn shuttle_lands_exactly_once_at_sixty_fps() {
    let (mut anim, mut cam) = fresh();
    let mut transitions = 0;
    let mut was_active = anim.intro_active();
    let mut min_elevation = f32::MAX;

    for _ in 0..(60 * 40) {
        anim.step(1.0 / 60.0, &mut cam);
        let active = anim.intro_active();
        if was_active && !active {
            transitions += 1;
        }
        assert!(!(active && !was_active), "intro re-entered");
        was_active = active;
        min_elevation = min_elevation.min(anim.shuttle_elevation());
    }

    assert_eq!(transitions, 1);
    assert_eq!(anim.phase(), IntroPhase::Grounded);
    assert_eq!(anim.shuttle_elevation(), 0.0);
    assert!(min_elevation >= 0.0);
}

#[test]
fn rotations_keep_running_after_landing() {
    let (mut anim, mut cam) = fresh();
    anim.step(100.0, &mut cam);
    let turret = anim.turret_angle();
    let sky = anim.skybox_angle();
    anim.step(2.0, &mut cam);
    assert!((anim.turret_angle() - (turret + 10.0)).abs() < 1e-3);
    assert!((anim.skybox_angle() - (sky + 0.6)).abs() < 1e-3);
}

#[test]
fn advance_and_step_agree() {
    let (mut by_time, mut cam_a) = fresh();
    let (mut by_step, mut cam_b) = fresh();
    let mut now = 0.0;
    for _ in 0..30 {
        now += 0.05;
        by_time.advance(now, &mut cam_a);
        by_step.step(0.05, &mut cam_b);
    }
    assert!((by_time.turret_angle() - by_step.turret_angle()).abs() < 1e-3);
    assert!((by_time.shuttle_elevation() - by_step.shuttle_elevation()).abs() < 1e-4);
    assert!((cam_a.position - cam_b.position).length() < 1e-5);
}

#[test]
fn colors_are_continuous_at_the_horizon() {
    let mut lighting = LightingModel::new(LightingConfig::default());
    let mut previous = lighting.colors();
    for _ in 0..400 {
        lighting.rotate(-0.2);
        let colors = lighting.colors();
        assert!((colors.light - previous.light).abs().max_element() < 0.05);
        assert_eq!(colors, lighting.colors());
        previous = colors;
    }
    assert!(lighting.is_night());
}
