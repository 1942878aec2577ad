// VIEW: Shader collaborators and the wgpu renderer
pub mod gpu_init;
pub mod render;
pub mod shader;

pub use gpu_init::GpuContext;
pub use render::RenderState;
pub use shader::{
    FrameRecording, MeshId, MeshModel, Model, PassControl, PassRecorder, Program, RecordingShader, Shader,
    SharedRecording, UniformValue,
};
