use clap::Parser;
use glam::Vec3;

/// Command line options for the native viewer
#[derive(Debug, Clone, Parser)]
#[command(name = "moonbase", about = "Lunar outpost scene with shadows and a day/night cycle")]
pub struct Args {
    /// Initial window width in physical pixels
    #[arg(long, default_value_t = 1920)]
    pub width: u32,

    /// Initial window height in physical pixels
    #[arg(long, default_value_t = 1080)]
    pub height: u32,

    #[arg(long, default_value = "Moon Project")]
    pub title: String,

    /// Edge length of the square shadow map
    #[arg(long, default_value_t = 2048)]
    pub shadow_resolution: u32,

    /// Hide the diagnostics overlay
    #[arg(long, default_value_t = false)]
    pub no_hud: bool,
}

// Camera
pub const CAMERA_START_POSITION: Vec3 = Vec3::new(1.2, 3.04, 5.0);
pub const CAMERA_START_TARGET: Vec3 = Vec3::new(4.0, 3.0, -10.0);
pub const CAMERA_FOV_Y_DEG: f32 = 45.0;
pub const CAMERA_Z_NEAR: f32 = 0.1;
pub const CAMERA_Z_FAR: f32 = 100.0;
/// Distance moved per frame while a movement key is held
pub const CAMERA_MOVE_SPEED: f32 = 0.1;
/// Degrees of yaw/pitch per pixel of mouse motion
pub const MOUSE_SENSITIVITY: f32 = 0.1;
pub const MOUSE_START_YAW_DEG: f32 = -79.43;
pub const MOUSE_PITCH_LIMIT_DEG: f32 = 89.0;

// Scene
/// Degrees per frame applied to the whole outpost while Q/E is held
pub const OBJECT_YAW_STEP_DEG: f32 = 1.0;
pub const FOG_START_DENSITY: f32 = 0.02;
pub const FOG_DENSITY_STEP: f32 = 0.002;
pub const FOG_MAX_DENSITY: f32 = 0.36;
pub const CLEAR_COLOR: [f64; 4] = [0.7, 0.7, 0.7, 1.0];

/// Rates and constants driving the time-based animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationConfig {
    /// Turret spin in degrees per second
    pub turret_rate: f32,
    /// Skybox spin in degrees per second
    pub skybox_rate: f32,
    pub skybox_start_angle: f32,
    pub shuttle_start_elevation: f32,
    pub shuttle_start_speed: f32,
    /// Elevation below which the shuttle slows down for final approach
    pub approach_threshold: f32,
    pub approach_speed_step: f32,
    /// Camera follows the descent by `speed / divisor` each frame
    pub camera_follow_divisor: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            turret_rate: 5.0,
            skybox_rate: 0.3,
            skybox_start_angle: 5.0,
            shuttle_start_elevation: 5.0,
            shuttle_start_speed: 0.3,
            approach_threshold: 2.0,
            approach_speed_step: 0.1,
            camera_follow_divisor: 290.0,
        }
    }
}

/// Sun and point light setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingConfig {
    pub sun_start_direction: Vec3,
    /// Degrees about +Z applied every frame
    pub cycle_step_deg: f32,
    /// Degrees about +Z applied per frame while a sun key is held
    pub manual_step_deg: f32,
    pub lamp_positions: [Vec3; 2],
    pub red_light_position: Vec3,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            sun_start_direction: Vec3::new(32.0, 20.0, 1.0),
            cycle_step_deg: -0.002,
            manual_step_deg: 0.2,
            lamp_positions: [Vec3::new(2.13, 0.74, 3.45), Vec3::new(1.95, 0.74, 3.61)],
            red_light_position: Vec3::new(2.27, 0.16, -1.23),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["moonbase"]);
        assert_eq!(args.width, 1920);
        assert_eq!(args.height, 1080);
        assert_eq!(args.title, "Moon Project");
        assert_eq!(args.shadow_resolution, 2048);
        assert!(!args.no_hud);
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from(["moonbase", "--width", "800", "--shadow-resolution", "1024", "--no-hud"]);
        assert_eq!(args.width, 800);
        assert_eq!(args.shadow_resolution, 1024);
        assert!(args.no_hud);
    }
}
