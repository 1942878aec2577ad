//! Shader and model collaborators.
//!
//! Programs are driven GL-style: activate, set uniforms by name, draw. Nothing
//! touches the GPU here. Each draw snapshots the program's uniform block into a
//! shared [`FrameRecording`], which the renderer later encodes into wgpu passes.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Mat3, Mat4, Vec3};

use crate::model::PolygonMode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec3(Vec3),
    Mat3(Mat3),
    Mat4(Mat4),
}

/// Index into the renderer's mesh table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

pub trait Shader {
    fn activate(&mut self);
    fn set_uniform(&mut self, name: &str, value: UniformValue);
    /// Submit a mesh with the program's current uniforms.
    fn draw_mesh(&mut self, mesh: MeshId);
}

pub trait Model {
    fn draw(&self, shader: &mut dyn Shader);
}

/// A model backed by a single uploaded mesh.
pub struct MeshModel {
    pub mesh: MeshId,
}

impl Model for MeshModel {
    fn draw(&self, shader: &mut dyn Shader) {
        shader.draw_mesh(self.mesh);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    Depth,
    Lit,
    Sky,
}

/// Uniform block shared by all three programs. Layout matches the WGSL `Uniforms`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShaderUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// mat3 padded into the upper-left of a mat4
    pub normal_matrix: [[f32; 4]; 4],
    pub light_space: [[f32; 4]; 4],
    pub light_model: [[f32; 4]; 4],
    pub red_light_model: [[f32; 4]; 4],
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
    pub fog_color: [f32; 4],
    pub red_light_pos: [f32; 4],
    pub light_pos1: [f32; 4],
    pub light_pos2: [f32; 4],
    /// x: fog density, y: red light on, z: shadow map bound
    pub params: [f32; 4],
}

impl Default for ShaderUniforms {
    fn default() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self {
            model: identity,
            view: identity,
            projection: identity,
            normal_matrix: identity,
            light_space: identity,
            light_model: identity,
            red_light_model: identity,
            light_dir: [0.0, 1.0, 0.0, 0.0],
            light_color: [1.0; 4],
            fog_color: [0.5, 0.5, 0.5, 1.0],
            red_light_pos: [0.0; 4],
            light_pos1: [0.0; 4],
            light_pos2: [0.0; 4],
            params: [0.0; 4],
        }
    }
}

fn vec4(v: Vec3) -> [f32; 4] {
    [v.x, v.y, v.z, 0.0]
}

impl ShaderUniforms {
    /// Write a uniform by its GLSL-style name. Returns false for unknown names or
    /// a value of the wrong kind, which are ignored like a missing GL location.
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        use UniformValue as U;
        match (name, value) {
            ("model", U::Mat4(m)) => self.model = m.to_cols_array_2d(),
            ("view", U::Mat4(m)) => self.view = m.to_cols_array_2d(),
            ("projection", U::Mat4(m)) => self.projection = m.to_cols_array_2d(),
            ("normalMatrix", U::Mat3(m)) => self.normal_matrix = Mat4::from_mat3(m).to_cols_array_2d(),
            ("lightSpaceTrMatrix", U::Mat4(m)) => self.light_space = m.to_cols_array_2d(),
            ("lightModel", U::Mat4(m)) => self.light_model = m.to_cols_array_2d(),
            ("redLightModel", U::Mat4(m)) => self.red_light_model = m.to_cols_array_2d(),
            ("lightDir", U::Vec3(v)) => self.light_dir = vec4(v),
            ("lightColor", U::Vec3(v)) => self.light_color = vec4(v),
            ("fogColor", U::Vec3(v)) => self.fog_color = vec4(v),
            ("redLightPos", U::Vec3(v)) => self.red_light_pos = vec4(v),
            ("lightPos1", U::Vec3(v)) => self.light_pos1 = vec4(v),
            ("lightPos2", U::Vec3(v)) => self.light_pos2 = vec4(v),
            ("fogDensity", U::Float(f)) => self.params[0] = f,
            ("redLightOn", U::Int(i)) => self.params[1] = if i != 0 { 1.0 } else { 0.0 },
            ("shadowMap", U::Int(_)) => self.params[2] = 1.0,
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Depth,
    Lit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearFlags {
    pub color: bool,
    pub depth: bool,
}

impl ClearFlags {
    pub const DEPTH: ClearFlags = ClearFlags { color: false, depth: true };
    pub const COLOR_DEPTH: ClearFlags = ClearFlags { color: true, depth: true };
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: Program,
    pub mesh: MeshId,
    pub uniforms: ShaderUniforms,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassRecord {
    pub kind: PassKind,
    pub viewport: (u32, u32),
    pub clear: ClearFlags,
    pub shadow_map_unit: Option<u32>,
    pub polygon_mode: PolygonMode,
    pub draws: Vec<DrawRecord>,
}

/// Ordered passes and draws submitted during one frame.
///
/// Cleared pass records are parked and handed back out by the next
/// `begin_pass`, so their draw lists keep their capacity across frames.
#[derive(Debug, Default)]
pub struct FrameRecording {
    pub passes: Vec<PassRecord>,
    spare: Vec<PassRecord>,
    active: Option<Program>,
}

impl FrameRecording {
    pub fn clear(&mut self) {
        for mut pass in self.passes.drain(..) {
            pass.draws.clear();
            self.spare.push(pass);
        }
        self.active = None;
    }

    /// Open a new pass, reusing a parked record of the same kind when there is one.
    pub fn begin_pass(&mut self, kind: PassKind, viewport: (u32, u32), clear: ClearFlags, polygon_mode: PolygonMode) {
        let reused = match self.spare.iter().position(|p| p.kind == kind) {
            Some(i) => Some(self.spare.swap_remove(i)),
            None => self.spare.pop(),
        };
        let mut pass = reused.unwrap_or_else(|| PassRecord {
            kind,
            viewport,
            clear,
            shadow_map_unit: None,
            polygon_mode,
            draws: Vec::new(),
        });
        pass.kind = kind;
        pass.viewport = viewport;
        pass.clear = clear;
        pass.shadow_map_unit = None;
        pass.polygon_mode = polygon_mode;
        self.passes.push(pass);
    }

    pub fn active_program(&self) -> Option<Program> {
        self.active
    }

    pub fn draw_count(&self) -> usize {
        self.passes.iter().map(|p| p.draws.len()).sum()
    }
}

pub type SharedRecording = Rc<RefCell<FrameRecording>>;

/// Pass boundaries, viewport and clears.
pub trait PassControl {
    fn begin_pass(&mut self, kind: PassKind, viewport: (u32, u32), clear: ClearFlags, polygon_mode: PolygonMode);
    fn bind_shadow_map(&mut self, unit: u32);
}

pub struct PassRecorder {
    sink: SharedRecording,
}

impl PassRecorder {
    pub fn new(sink: SharedRecording) -> Self {
        Self { sink }
    }
}

impl PassControl for PassRecorder {
    fn begin_pass(&mut self, kind: PassKind, viewport: (u32, u32), clear: ClearFlags, polygon_mode: PolygonMode) {
        self.sink.borrow_mut().begin_pass(kind, viewport, clear, polygon_mode);
    }

    fn bind_shadow_map(&mut self, unit: u32) {
        if let Some(pass) = self.sink.borrow_mut().passes.last_mut() {
            pass.shadow_map_unit = Some(unit);
        }
    }
}

/// GL-style program whose uniforms persist between frames.
pub struct RecordingShader {
    program: Program,
    uniforms: ShaderUniforms,
    sink: SharedRecording,
}

impl RecordingShader {
    pub fn new(program: Program, sink: SharedRecording) -> Self {
        Self { program, uniforms: ShaderUniforms::default(), sink }
    }

    pub fn program(&self) -> Program { self.program }

    pub fn uniforms(&self) -> &ShaderUniforms { &self.uniforms }
}

impl Shader for RecordingShader {
    fn activate(&mut self) {
        self.sink.borrow_mut().active = Some(self.program);
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        if !self.uniforms.set(name, value) {
            tracing::debug!(program = ?self.program, name, "ignoring unknown uniform");
        }
    }

    fn draw_mesh(&mut self, mesh: MeshId) {
        let mut sink = self.sink.borrow_mut();
        if sink.active != Some(self.program) {
            tracing::warn!(program = ?self.program, active = ?sink.active, "draw issued on inactive program");
        }
        match sink.passes.last_mut() {
            Some(pass) => pass.draws.push(DrawRecord { program: self.program, mesh, uniforms: self.uniforms }),
            None => tracing::warn!(program = ?self.program, ?mesh, "draw issued outside of a pass"),
        }
    }
}
