// MODEL: Scene state and time-driven animation
pub mod animation;
pub mod camera;
pub mod clock;
pub mod lighting;
pub mod scene;
pub mod shadow;

pub use animation::{AnimationState, IntroPhase};
pub use camera::{Camera, MoveDirection};
pub use clock::{Clock, ManualClock, SystemClock};
pub use lighting::{LightColors, LightingModel};
pub use scene::{Fog, ObjectTransforms, PolygonMode, SceneObject, SceneState, TurretId, TURRET_PIVOTS};
pub use shadow::ShadowSettings;
