use glam::{Mat3, Mat4, Vec3};

use crate::config::{
    AnimationConfig, LightingConfig, CAMERA_START_POSITION, CAMERA_START_TARGET, FOG_DENSITY_STEP,
    FOG_MAX_DENSITY, FOG_START_DENSITY,
};
use crate::model::{AnimationState, Camera, LightingModel, ShadowSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolygonMode {
    #[default]
    Fill,
    Point,
    Line,
}

/// Drawable pieces of the outpost, in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneObject {
    Base,
    Turret(TurretId),
    Shuttle,
    Sky,
}

impl SceneObject {
    pub const ALL: [SceneObject; 6] = [
        SceneObject::Base,
        SceneObject::Turret(TurretId::First),
        SceneObject::Turret(TurretId::Second),
        SceneObject::Turret(TurretId::Third),
        SceneObject::Shuttle,
        SceneObject::Sky,
    ];
}

/// One of the three outpost turrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurretId {
    First,
    Second,
    Third,
}

impl TurretId {
    pub const ALL: [TurretId; 3] = [TurretId::First, TurretId::Second, TurretId::Third];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn pivot(self) -> TurretPivot {
        TURRET_PIVOTS[self.index()]
    }
}

/// Point a turret spins around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurretPivot {
    pub pivot: Vec3,
    pub axis: Vec3,
}

pub const TURRET_PIVOTS: [TurretPivot; 3] = [
    TurretPivot { pivot: Vec3::new(12.811, 1.7615, 5.8126), axis: Vec3::Y },
    TurretPivot { pivot: Vec3::new(-9.7728, 1.6396, -3.6212), axis: Vec3::Y },
    TurretPivot { pivot: Vec3::new(-6.9807, 1.621, 17.61), axis: Vec3::Y },
];

/// `base × T(pivot) × R(axis, angle) × T(-pivot)`
pub fn rotate_about_pivot(base: Mat4, pivot: Vec3, axis: Vec3, angle_deg: f32) -> Mat4 {
    base * Mat4::from_translation(pivot)
        * Mat4::from_axis_angle(axis.normalize(), angle_deg.to_radians())
        * Mat4::from_translation(-pivot)
}

/// Normal matrix for eye-space lighting.
pub fn normal_matrix(view: Mat4, model: Mat4) -> Mat3 {
    Mat3::from_mat4(view * model).inverse().transpose()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    density: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self { density: FOG_START_DENSITY }
    }
}

impl Fog {
    pub fn density(&self) -> f32 { self.density }

    pub fn thicken(&mut self) {
        self.density = (self.density + FOG_DENSITY_STEP).min(FOG_MAX_DENSITY);
    }

    pub fn thin(&mut self) {
        self.density = (self.density - FOG_DENSITY_STEP).max(0.0);
    }
}

/// Model matrices for one frame. Built once and read by both passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransforms {
    pub base: Mat4,
    pub turrets: [Mat4; 3],
    pub shuttle: Mat4,
    pub red_light: Mat4,
    pub sky: Mat4,
}

impl ObjectTransforms {
    pub fn model(&self, object: SceneObject) -> Mat4 {
        match object {
            SceneObject::Base => self.base,
            SceneObject::Turret(id) => self.turrets[id.index()],
            SceneObject::Shuttle => self.shuttle,
            SceneObject::Sky => self.sky,
        }
    }
}

/// Everything the frame loop mutates, owned in one place.
pub struct SceneState {
    pub camera: Camera,
    pub animation: AnimationState,
    pub lighting: LightingModel,
    pub shadow: ShadowSettings,
    pub fog: Fog,
    /// Manual yaw of the whole outpost in degrees
    pub object_yaw: f32,
    pub polygon_mode: PolygonMode,
}

impl SceneState {
    pub fn new(start_time: f64, shadow: ShadowSettings) -> Self {
        Self::with_config(AnimationConfig::default(), LightingConfig::default(), shadow, start_time)
    }

    pub fn with_config(
        animation: AnimationConfig,
        lighting: LightingConfig,
        shadow: ShadowSettings,
        start_time: f64,
    ) -> Self {
        Self {
            camera: Camera::new(CAMERA_START_POSITION, CAMERA_START_TARGET, Vec3::Y),
            animation: AnimationState::new(animation, start_time),
            lighting: LightingModel::new(lighting),
            shadow,
            fog: Fog::default(),
            object_yaw: 0.0,
            polygon_mode: PolygonMode::Fill,
        }
    }

    /// Red beacon is on exactly while the intro runs.
    pub fn red_light_enabled(&self) -> bool {
        self.animation.intro_active()
    }

    pub fn object_transforms(&self) -> ObjectTransforms {
        let base = Mat4::from_rotation_y(self.object_yaw.to_radians());
        let turret_angle = self.animation.turret_angle();
        let turrets = TURRET_PIVOTS.map(|t| rotate_about_pivot(base, t.pivot, t.axis, turret_angle));
        ObjectTransforms {
            base,
            turrets,
            shuttle: self.animation.shuttle_model(self.object_yaw),
            red_light: self.animation.red_light_model(),
            sky: self.animation.sky_model(),
        }
    }

    pub fn light_space_transform(&self) -> Mat4 {
        self.shadow.light_space_transform(self.lighting.direction())
    }
}
