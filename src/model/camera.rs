use glam::{Mat4, Vec3};

use crate::config::{CAMERA_FOV_Y_DEG, CAMERA_Z_FAR, CAMERA_Z_NEAR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Free-fly camera described by an explicit basis.
///
/// `front` and `right` are kept unit length and `target` always sits one unit
/// in front of `position`. A `front` parallel to `up` produces a NaN `right`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    front: Vec3,
    right: Vec3,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3, up: Vec3) -> Self {
        let front = (target - position).normalize();
        let right = front.cross(up).normalize();
        Self { position, target, up, front, right }
    }

    pub fn front(&self) -> Vec3 { self.front }

    pub fn right(&self) -> Vec3 { self.right }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(CAMERA_FOV_Y_DEG.to_radians(), aspect, CAMERA_Z_NEAR, CAMERA_Z_FAR)
    }

    /// Translate along the camera basis. Negative speed moves the opposite way.
    pub fn move_dir(&mut self, direction: MoveDirection, speed: f32) {
        match direction {
            MoveDirection::Forward => self.position += self.front * speed,
            MoveDirection::Backward => self.position -= self.front * speed,
            MoveDirection::Right => self.position += self.right * speed,
            MoveDirection::Left => self.position -= self.right * speed,
            MoveDirection::Up => self.position += self.up * speed,
            MoveDirection::Down => self.position -= self.up * speed,
        }
        self.target = self.position + self.front;
    }

    /// Point the camera using pitch/yaw in degrees. The caller clamps pitch.
    pub fn set_orientation(&mut self, pitch: f32, yaw: f32) {
        let (pitch, yaw) = (pitch.to_radians(), yaw.to_radians());
        let direction = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
        self.front = direction.normalize();
        self.target = self.position + self.front;
        self.right = self.front.cross(self.up).normalize();
    }
}
