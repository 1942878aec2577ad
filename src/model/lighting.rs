use glam::{Mat3, Vec3};

use crate::config::LightingConfig;

/// Light and fog colors derived from the sun position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightColors {
    pub light: Vec3,
    pub fog: Vec3,
}

/// Directional sun plus the fixed point lights around the outpost.
///
/// Night is never stored: it is read from the sign of `direction.y` each time
/// colors are requested.
#[derive(Debug, Clone)]
pub struct LightingModel {
    config: LightingConfig,
    direction: Vec3,
}

impl LightingModel {
    pub fn new(config: LightingConfig) -> Self {
        Self { config, direction: config.sun_start_direction }
    }

    pub fn direction(&self) -> Vec3 { self.direction }

    pub fn config(&self) -> &LightingConfig { &self.config }

    /// Rotate the sun about world +Z by a signed angle in degrees.
    pub fn rotate(&mut self, angle_deg: f32) {
        self.direction = Mat3::from_rotation_z(angle_deg.to_radians()) * self.direction;
    }

    /// Automatic day/night drift, once per frame.
    pub fn advance_cycle(&mut self) {
        self.rotate(self.config.cycle_step_deg);
    }

    pub fn colors(&self) -> LightColors {
        if self.direction.y < 0.0 {
            // No floor: extreme directions can drive the level negative
            let level = 1.0 + self.direction.y / 50.0;
            LightColors { light: Vec3::splat(level), fog: Vec3::splat(level / 2.0) }
        } else {
            LightColors { light: Vec3::ONE, fog: Vec3::splat(0.5) }
        }
    }

    pub fn is_night(&self) -> bool {
        self.direction.y < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daylight_colors() {
        let light = LightingModel::new(LightingConfig::default());
        let colors = light.colors();
        assert_eq!(colors.light, Vec3::ONE);
        assert_eq!(colors.fog, Vec3::splat(0.5));
        assert_eq!(light.colors(), colors);
    }

    #[test]
    fn test_night_dims_linearly() {
        let mut light = LightingModel::new(LightingConfig::default());
        light.direction = Vec3::new(10.0, -25.0, 1.0);
        let colors = light.colors();
        assert!((colors.light.x - 0.5).abs() < 1e-6);
        assert!((colors.fog.y - 0.25).abs() < 1e-6);
        assert!(light.is_night());
    }

    #[test]
    fn test_continuous_at_horizon() {
        let mut light = LightingModel::new(LightingConfig::default());
        light.direction = Vec3::new(1.0, -1e-4, 0.0);
        let below = light.colors();
        light.direction = Vec3::new(1.0, 0.0, 0.0);
        let at = light.colors();
        assert!((below.light - at.light).abs().max_element() < 1e-5);
        assert!((below.fog - at.fog).abs().max_element() < 1e-5);
    }

    #[test]
    fn test_no_floor_for_extreme_input() {
        let mut light = LightingModel::new(LightingConfig::default());
        light.direction = Vec3::new(0.0, -100.0, 0.0);
        assert!(light.colors().light.x < 0.0);
    }

    #[test]
    fn test_rotation_about_z() {
        let mut light = LightingModel::new(LightingConfig::default());
        let before = light.direction();
        light.rotate(90.0);
        let after = light.direction();
        assert!((after.x + before.y).abs() < 1e-4);
        assert!((after.y - before.x).abs() < 1e-4);
        assert_eq!(after.z, before.z);
        light.rotate(-90.0);
        assert!((light.direction() - before).length() < 1e-4);
    }

    #[test]
    fn test_cycle_sets_sun_eventually() {
        let mut light = LightingModel::new(LightingConfig::default());
        // atan2(20, 32) ≈ 32°, so ~16k frames at 0.002°/frame
        for _ in 0..20_000 {
            light.advance_cycle();
        }
        assert!(light.is_night());
        assert!(light.colors().light.x < 1.0);
    }
}
