use glam::{Mat3, Mat4};

use crate::controller::input::{InputState, InputTranslator, MouseLook};
use crate::model::scene::normal_matrix;
use crate::model::{Clock, IntroPhase, ObjectTransforms, SceneObject, SceneState};
use crate::view::shader::{ClearFlags, MeshId, MeshModel, Model, PassControl, PassKind, Shader, UniformValue};

/// Texture unit the lit program samples the shadow map from.
pub const SHADOW_MAP_UNIT: i32 = 3;

/// The drawable pieces of the outpost.
pub struct SceneModels {
    pub base: Box<dyn Model>,
    pub turrets: [Box<dyn Model>; 3],
    pub shuttle: Box<dyn Model>,
    pub sky: Box<dyn Model>,
}

impl SceneModels {
    /// One mesh per object, ids in `SceneObject::ALL` order as uploaded by the renderer.
    pub fn outpost() -> Self {
        let mesh = |id| -> Box<dyn Model> { Box::new(MeshModel { mesh: MeshId(id) }) };
        Self {
            base: mesh(0),
            turrets: [mesh(1), mesh(2), mesh(3)],
            shuttle: mesh(4),
            sky: mesh(5),
        }
    }

    pub fn get(&self, object: SceneObject) -> &dyn Model {
        match object {
            SceneObject::Base => self.base.as_ref(),
            SceneObject::Turret(id) => self.turrets[id.index()].as_ref(),
            SceneObject::Shuttle => self.shuttle.as_ref(),
            SceneObject::Sky => self.sky.as_ref(),
        }
    }
}

/// Everything a frame draws into.
pub struct FrameTargets<'a> {
    pub passes: &'a mut dyn PassControl,
    pub depth: &'a mut dyn Shader,
    pub lit: &'a mut dyn Shader,
    pub sky: &'a mut dyn Shader,
    pub models: &'a SceneModels,
}

/// What happened during one frame, for the HUD and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub dt: f32,
    pub phase: IntroPhase,
    pub light_space: Mat4,
    pub transforms: ObjectTransforms,
}

/// Drives one frame: input, animation, then the depth and lit passes.
pub struct FrameSequencer<C: Clock> {
    clock: C,
    pub translator: InputTranslator,
    pub mouse_look: MouseLook,
    frame: u64,
}

impl<C: Clock> FrameSequencer<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, translator: InputTranslator::default(), mouse_look: MouseLook::default(), frame: 0 }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Frames completed so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn run_frame(
        &mut self,
        scene: &mut SceneState,
        input: &mut InputState,
        window_size: (u32, u32),
        targets: FrameTargets<'_>,
    ) -> FrameReport {
        let (dx, dy) = input.consume_look();
        if dx != 0.0 || dy != 0.0 {
            self.mouse_look.apply(&mut scene.camera, dx, dy);
        }
        if !scene.animation.intro_active() {
            self.translator.apply(input, scene);
        }

        let dt = scene.animation.advance(self.clock.now(), &mut scene.camera);
        scene.lighting.advance_cycle();
        let transforms = scene.object_transforms();
        let light_space = scene.light_space_transform();

        let FrameTargets { passes, depth, lit, sky, models } = targets;
        self.depth_pass(scene, &transforms, light_space, window_size, passes, depth, sky, models);
        self.lit_pass(scene, &transforms, light_space, window_size, passes, lit, sky, models);

        self.frame += 1;
        FrameReport { frame: self.frame, dt, phase: scene.animation.phase(), light_space, transforms }
    }

    #[allow(clippy::too_many_arguments)]
    fn depth_pass(
        &self,
        scene: &SceneState,
        transforms: &ObjectTransforms,
        light_space: Mat4,
        window_size: (u32, u32),
        passes: &mut dyn PassControl,
        depth: &mut dyn Shader,
        sky: &mut dyn Shader,
        models: &SceneModels,
    ) {
        let resolution = scene.shadow.resolution;
        passes.begin_pass(PassKind::Depth, (resolution, resolution), ClearFlags::DEPTH, scene.polygon_mode);

        depth.activate();
        depth.set_uniform("lightSpaceTrMatrix", UniformValue::Mat4(light_space));
        for object in SceneObject::ALL.into_iter().filter(|o| *o != SceneObject::Sky) {
            depth.set_uniform("model", UniformValue::Mat4(transforms.model(object)));
            models.get(object).draw(depth);
        }

        // Sky goes through its own program; the depth target has nothing for it to write
        self.draw_sky(scene, transforms, window_size, sky, models);
    }

    #[allow(clippy::too_many_arguments)]
    fn lit_pass(
        &self,
        scene: &SceneState,
        transforms: &ObjectTransforms,
        light_space: Mat4,
        window_size: (u32, u32),
        passes: &mut dyn PassControl,
        lit: &mut dyn Shader,
        sky: &mut dyn Shader,
        models: &SceneModels,
    ) {
        passes.begin_pass(PassKind::Lit, window_size, ClearFlags::COLOR_DEPTH, scene.polygon_mode);

        let view = scene.camera.view_matrix();
        let projection = scene.camera.projection(aspect(window_size));
        let colors = scene.lighting.colors();
        let lights = scene.lighting.config();

        lit.activate();
        lit.set_uniform("view", UniformValue::Mat4(view));
        lit.set_uniform("projection", UniformValue::Mat4(projection));
        lit.set_uniform("lightSpaceTrMatrix", UniformValue::Mat4(light_space));
        lit.set_uniform("lightDir", UniformValue::Vec3(scene.lighting.direction()));
        lit.set_uniform("lightColor", UniformValue::Vec3(colors.light));
        lit.set_uniform("fogColor", UniformValue::Vec3(colors.fog));
        lit.set_uniform("fogDensity", UniformValue::Float(scene.fog.density()));
        lit.set_uniform("lightModel", UniformValue::Mat4(transforms.base));
        lit.set_uniform("lightPos1", UniformValue::Vec3(lights.lamp_positions[0]));
        lit.set_uniform("lightPos2", UniformValue::Vec3(lights.lamp_positions[1]));
        lit.set_uniform("redLightPos", UniformValue::Vec3(lights.red_light_position));
        lit.set_uniform("redLightModel", UniformValue::Mat4(transforms.red_light));
        lit.set_uniform("redLightOn", UniformValue::Int(scene.red_light_enabled() as i32));

        passes.bind_shadow_map(SHADOW_MAP_UNIT as u32);
        lit.set_uniform("shadowMap", UniformValue::Int(SHADOW_MAP_UNIT));

        for object in SceneObject::ALL.into_iter().filter(|o| *o != SceneObject::Sky) {
            let model = transforms.model(object);
            lit.set_uniform("model", UniformValue::Mat4(model));
            lit.set_uniform("normalMatrix", UniformValue::Mat3(normal_matrix(view, model)));
            models.get(object).draw(lit);
        }

        self.draw_sky(scene, transforms, window_size, sky, models);
    }

    fn draw_sky(
        &self,
        scene: &SceneState,
        transforms: &ObjectTransforms,
        window_size: (u32, u32),
        sky: &mut dyn Shader,
        models: &SceneModels,
    ) {
        // Translation stripped so the sky stays centred on the eye
        let view = Mat4::from_mat3(Mat3::from_mat4(scene.camera.view_matrix()));
        sky.activate();
        sky.set_uniform("view", UniformValue::Mat4(view));
        sky.set_uniform("projection", UniformValue::Mat4(scene.camera.projection(aspect(window_size))));
        sky.set_uniform("model", UniformValue::Mat4(transforms.sky));
        sky.set_uniform("lightColor", UniformValue::Vec3(scene.lighting.colors().light));
        models.get(SceneObject::Sky).draw(sky);
    }
}

fn aspect((width, height): (u32, u32)) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ManualClock, ShadowSettings};
    use crate::view::shader::{PassRecorder, Program, RecordingShader, SharedRecording};

    #[test]
    fn test_pass_order_and_draw_order() {
        let sink = SharedRecording::default();
        let mut passes = PassRecorder::new(sink.clone());
        let mut depth = RecordingShader::new(Program::Depth, sink.clone());
        let mut lit = RecordingShader::new(Program::Lit, sink.clone());
        let mut sky = RecordingShader::new(Program::Sky, sink.clone());
        let models = SceneModels::outpost();
        let clock = ManualClock::new(0.0);
        let mut scene = SceneState::new(0.0, ShadowSettings::default());
        let mut seq = FrameSequencer::new(clock.clone());
        let mut input = InputState::new();

        clock.tick(0.016);
        let report = seq.run_frame(
            &mut scene,
            &mut input,
            (800, 600),
            FrameTargets { passes: &mut passes, depth: &mut depth, lit: &mut lit, sky: &mut sky, models: &models },
        );

        let rec = sink.borrow();
        assert_eq!(rec.passes.len(), 2);
        assert_eq!(rec.passes[0].kind, PassKind::Depth);
        assert_eq!(rec.passes[0].viewport, (2048, 2048));
        assert_eq!(rec.passes[1].kind, PassKind::Lit);
        assert_eq!(rec.passes[1].viewport, (800, 600));
        assert_eq!(rec.passes[1].shadow_map_unit, Some(3));
        let meshes: Vec<usize> = rec.passes[1].draws.iter().map(|d| d.mesh.0).collect();
        assert_eq!(meshes, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(rec.passes[0].draws.last().map(|d| d.program), Some(Program::Sky));
        assert_eq!(report.frame, 1);
        assert!((report.dt - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_aspect_guards_zero_height() {
        assert_eq!(aspect((800, 0)), 800.0);
        assert_eq!(aspect((800, 400)), 2.0);
    }
}
