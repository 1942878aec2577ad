use egui::Context;

use crate::controller::FrameReport;
use crate::model::{IntroPhase, PolygonMode, SceneState};

/// Rolling frames-per-second estimate, refreshed once a second.
#[derive(Debug, Default, Clone)]
pub struct FpsCounter {
    frames: u32,
    elapsed: f32,
    pub fps: f32,
}

impl FpsCounter {
    pub fn tick(&mut self, dt: f32) {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed >= 1.0 {
            self.fps = self.frames as f32 / self.elapsed;
            self.frames = 0;
            self.elapsed = 0.0;
        }
    }
}

/// Snapshot of what the overlay shows, taken after the frame ran.
#[derive(Debug, Clone)]
pub struct HudInfo {
    pub fps: f32,
    pub frame: u64,
    pub phase: IntroPhase,
    pub shuttle_elevation: f32,
    pub shuttle_speed: f32,
    pub camera_position: glam::Vec3,
    pub sun_direction: glam::Vec3,
    pub night: bool,
    pub fog_density: f32,
    pub polygon_mode: PolygonMode,
    pub polygon_mode_supported: bool,
}

impl HudInfo {
    pub fn collect(scene: &SceneState, report: &FrameReport, fps: f32, polygon_mode_supported: bool) -> Self {
        Self {
            fps,
            frame: report.frame,
            phase: report.phase,
            shuttle_elevation: scene.animation.shuttle_elevation(),
            shuttle_speed: scene.animation.shuttle_speed(),
            camera_position: scene.camera.position,
            sun_direction: scene.lighting.direction(),
            night: scene.lighting.is_night(),
            fog_density: scene.fog.density(),
            polygon_mode: scene.polygon_mode,
            polygon_mode_supported,
        }
    }
}

/// Build the overlay for this frame.
pub fn build_hud(ctx: &Context, info: &HudInfo) {
    draw_debug_window(ctx, info);
    if info.phase == IntroPhase::Descending {
        draw_intro_banner(ctx, info);
    }
}

fn draw_debug_window(ctx: &Context, info: &HudInfo) {
    let p = info.camera_position;
    let sun = info.sun_direction;

    egui::Window::new("Debug")
        .default_pos([8.0, 8.0])
        .show(ctx, |ui| {
            ui.label(egui::RichText::new(format!("FPS: {:.0}  frame {}", info.fps, info.frame)).small());
            ui.label(egui::RichText::new(format!("Pos: x: {:.2} y: {:.2} z: {:.2}", p.x, p.y, p.z)).small());
            ui.label(egui::RichText::new(format!("Sun: {:.1}, {:.1}, {:.1} ({})", sun.x, sun.y, sun.z, if info.night { "night" } else { "day" })).small());
            ui.label(egui::RichText::new(format!("Fog density: {:.3}", info.fog_density)).small());
            let mode = if info.polygon_mode_supported {
                format!("{:?}", info.polygon_mode)
            } else {
                format!("{:?} (unsupported, filled)", info.polygon_mode)
            };
            ui.label(egui::RichText::new(format!("Polygon mode: {mode}")).small());
            ui.separator();
            ui.label(egui::RichText::new("Controls:").small());
            ui.label(egui::RichText::new("WASD - Move").small());
            ui.label(egui::RichText::new("Space / Shift - Up / Down").small());
            ui.label(egui::RichText::new("Q / E - Rotate outpost").small());
            ui.label(egui::RichText::new("X / Z - Fog thicker / thinner").small());
            ui.label(egui::RichText::new("C / V - Sun forward / back").small());
            ui.label(egui::RichText::new("F / P / L - Fill / point / line").small());
            ui.label(egui::RichText::new("Esc - Quit").small());
        });
}

fn draw_intro_banner(ctx: &Context, info: &HudInfo) {
    egui::Area::new(egui::Id::new("intro_banner"))
        .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -16.0])
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!(
                    "Descending  altitude {:.2}  speed {:.2}",
                    info.shuttle_elevation, info.shuttle_speed
                ))
                .color(egui::Color32::WHITE),
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_counter_updates_each_second() {
        let mut fps = FpsCounter::default();
        for _ in 0..59 {
            fps.tick(1.0 / 60.0);
        }
        assert_eq!(fps.fps, 0.0);
        fps.tick(1.0 / 60.0 + 1e-4);
        assert!((fps.fps - 60.0).abs() < 0.1);
    }
}
