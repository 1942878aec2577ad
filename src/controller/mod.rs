// CONTROLLER: Input handling and the per-frame update sequence
pub mod frame_loop;
pub mod input;

pub use frame_loop::{FrameReport, FrameSequencer, FrameTargets, SceneModels, SHADOW_MAP_UNIT};
pub use input::{Action, InputEvent, InputState, InputTranslator, KeyBindings, MouseLook};
