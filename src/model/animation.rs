use glam::{Mat4, Vec3};

use crate::config::AnimationConfig;
use crate::model::camera::{Camera, MoveDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroPhase {
    /// Shuttle is still coming down and the camera rides along with it
    Descending,
    /// Landed. Terminal state.
    Grounded,
}

/// Time-driven scalars for the turrets, skybox and the shuttle intro.
#[derive(Debug, Clone)]
pub struct AnimationState {
    config: AnimationConfig,
    turret_angle: f32,
    skybox_angle: f32,
    shuttle_elevation: f32,
    shuttle_speed: f32,
    phase: IntroPhase,
    last_timestamp: f64,
}

impl AnimationState {
    pub fn new(config: AnimationConfig, start_time: f64) -> Self {
        Self {
            config,
            turret_angle: 0.0,
            skybox_angle: config.skybox_start_angle,
            shuttle_elevation: config.shuttle_start_elevation,
            shuttle_speed: config.shuttle_start_speed,
            phase: IntroPhase::Descending,
            last_timestamp: start_time,
        }
    }

    pub fn turret_angle(&self) -> f32 { self.turret_angle }
    pub fn skybox_angle(&self) -> f32 { self.skybox_angle }
    pub fn shuttle_elevation(&self) -> f32 { self.shuttle_elevation }
    pub fn shuttle_speed(&self) -> f32 { self.shuttle_speed }
    pub fn phase(&self) -> IntroPhase { self.phase }
    pub fn last_timestamp(&self) -> f64 { self.last_timestamp }

    pub fn intro_active(&self) -> bool {
        self.phase == IntroPhase::Descending
    }

    /// Advance to wall time `now`. Returns the elapsed seconds that were applied.
    pub fn advance(&mut self, now: f64, camera: &mut Camera) -> f32 {
        let dt = (now - self.last_timestamp).max(0.0) as f32;
        self.last_timestamp = now;
        self.step(dt, camera);
        dt
    }

    /// Apply `dt` seconds of animation.
    ///
    /// Rotations accumulate first, then the shuttle state is evaluated, then the
    /// camera is nudged down. The nudge is per call, not per second, so the
    /// camera's descent depends on frame rate.
    pub fn step(&mut self, dt: f32, camera: &mut Camera) {
        self.turret_angle += self.config.turret_rate * dt;
        self.skybox_angle += self.config.skybox_rate * dt;

        if self.phase == IntroPhase::Grounded {
            return;
        }

        self.shuttle_elevation -= self.shuttle_speed * dt;
        if self.shuttle_elevation <= 0.0 {
            self.shuttle_elevation = 0.0;
            self.phase = IntroPhase::Grounded;
            tracing::info!(turret_angle = self.turret_angle, "shuttle landed, intro finished");
        } else if self.shuttle_elevation < self.config.approach_threshold
            && self.shuttle_speed == self.config.shuttle_start_speed
        {
            self.shuttle_speed -= self.config.approach_speed_step;
            tracing::debug!(speed = self.shuttle_speed, "shuttle on final approach");
        }

        camera.move_dir(MoveDirection::Down, self.shuttle_speed / self.config.camera_follow_divisor);
    }

    /// Manual skybox offset, paired with a manual sun rotation.
    pub fn scrub_skybox(&mut self, delta_deg: f32) {
        self.skybox_angle += delta_deg;
    }

    /// Shuttle transform: a lift while descending, the outpost yaw once landed.
    pub fn shuttle_model(&self, object_yaw_deg: f32) -> Mat4 {
        match self.phase {
            IntroPhase::Descending => Mat4::from_translation(Vec3::new(0.0, self.shuttle_elevation, 0.0)),
            IntroPhase::Grounded => Mat4::from_rotation_y(object_yaw_deg.to_radians()),
        }
    }

    /// The red beacon rides with the shuttle and is parked far below once landed.
    pub fn red_light_model(&self) -> Mat4 {
        match self.phase {
            IntroPhase::Descending => Mat4::from_translation(Vec3::new(0.0, self.shuttle_elevation, 0.0)),
            IntroPhase::Grounded => Mat4::from_translation(Vec3::new(0.0, -100.0, 0.0)),
        }
    }

    pub fn sky_model(&self) -> Mat4 {
        Mat4::from_rotation_z((-self.skybox_angle).to_radians())
    }
}
