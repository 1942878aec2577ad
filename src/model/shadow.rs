use glam::{Mat4, Vec3};

/// Orthographic light frustum used for the shadow map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    pub half_extent: f32,
    pub near: f32,
    pub far: f32,
    pub resolution: u32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self { half_extent: 30.0, near: 1.0, far: 100.0, resolution: 2048 }
    }
}

impl ShadowSettings {
    pub fn with_resolution(resolution: u32) -> Self {
        Self { resolution: resolution.max(1), ..Self::default() }
    }

    /// Light projection × light view, looking from `direction` at the origin.
    ///
    /// Depends only on its inputs so both passes of a frame agree exactly.
    pub fn light_space_transform(&self, direction: Vec3) -> Mat4 {
        let view = Mat4::look_at_rh(direction, Vec3::ZERO, Vec3::Y);
        let e = self.half_extent;
        let projection = Mat4::orthographic_rh(-e, e, -e, e, self.near, self.far);
        projection * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_identical_recompute() {
        let settings = ShadowSettings::default();
        let dir = Vec3::new(32.0, 20.0, 1.0);
        let a = settings.light_space_transform(dir);
        let b = settings.light_space_transform(dir);
        let bits = |m: Mat4| m.to_cols_array().map(f32::to_bits);
        assert_eq!(bits(a), bits(b));
    }

    #[test]
    fn test_origin_lands_inside_depth_range() {
        let settings = ShadowSettings::default();
        let dir = Vec3::new(32.0, 20.0, 1.0);
        let clip = settings.light_space_transform(dir).project_point3(Vec3::ZERO);
        assert!(clip.x.abs() < 1e-4 && clip.y.abs() < 1e-4);
        // Origin sits |dir| units from the eye, between near and far
        let expected = (dir.length() - 1.0) / (100.0 - 1.0);
        assert!((clip.z - expected).abs() < 1e-4);
    }

    #[test]
    fn test_independent_of_resolution() {
        let dir = Vec3::new(32.0, 20.0, 1.0);
        assert_eq!(
            ShadowSettings::with_resolution(512).light_space_transform(dir),
            ShadowSettings::default().light_space_transform(dir)
        );
    }
}
