/// Keyboard and mouse handling, independent of the window backend
use std::collections::{HashMap, HashSet};

use winit::keyboard::KeyCode;

use crate::config::{
    CAMERA_MOVE_SPEED, MOUSE_PITCH_LIMIT_DEG, MOUSE_SENSITIVITY, MOUSE_START_YAW_DEG, OBJECT_YAW_STEP_DEG,
};
use crate::model::{Camera, MoveDirection, PolygonMode, SceneState};

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    MouseMove { dx: f32, dy: f32 },
    FocusLost,
}

/// Keys held right now plus mouse motion accumulated since the last frame.
#[derive(Debug, Default)]
pub struct InputState {
    pub pressed_keys: HashSet<KeyCode>,
    pub look_delta: (f32, f32),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                self.pressed_keys.insert(*key);
            }
            InputEvent::KeyUp(key) => {
                self.pressed_keys.remove(key);
            }
            InputEvent::MouseMove { dx, dy } => {
                self.look_delta.0 += dx;
                self.look_delta.1 += dy;
            }
            InputEvent::FocusLost => self.clear_keys(),
        }
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
    }

    pub fn consume_look(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.look_delta)
    }
}

/// Everything a key can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(MoveDirection),
    RotateObjectsLeft,
    RotateObjectsRight,
    FogThicker,
    FogThinner,
    /// Push the day forward: sun sinks, sky turns with it
    SunForward,
    SunBackward,
    Polygon(PolygonMode),
    Quit,
}

/// Key mapping configuration
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<KeyCode, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let map = [
            (KeyCode::KeyW, Action::Move(MoveDirection::Forward)),
            (KeyCode::KeyS, Action::Move(MoveDirection::Backward)),
            (KeyCode::KeyA, Action::Move(MoveDirection::Left)),
            (KeyCode::KeyD, Action::Move(MoveDirection::Right)),
            (KeyCode::Space, Action::Move(MoveDirection::Up)),
            (KeyCode::ShiftLeft, Action::Move(MoveDirection::Down)),
            (KeyCode::KeyQ, Action::RotateObjectsLeft),
            (KeyCode::KeyE, Action::RotateObjectsRight),
            (KeyCode::KeyX, Action::FogThicker),
            (KeyCode::KeyZ, Action::FogThinner),
            (KeyCode::KeyC, Action::SunForward),
            (KeyCode::KeyV, Action::SunBackward),
            (KeyCode::KeyF, Action::Polygon(PolygonMode::Fill)),
            (KeyCode::KeyP, Action::Polygon(PolygonMode::Point)),
            (KeyCode::KeyL, Action::Polygon(PolygonMode::Line)),
            (KeyCode::Escape, Action::Quit),
        ]
        .into_iter()
        .collect();
        Self { map }
    }
}

impl KeyBindings {
    pub fn action(&self, key: KeyCode) -> Option<Action> {
        self.map.get(&key).copied()
    }

    pub fn bind(&mut self, key: KeyCode, action: Action) {
        self.map.insert(key, action);
    }
}

/// Turns mouse deltas into an absolute pitch/yaw for the camera.
#[derive(Debug, Clone)]
pub struct MouseLook {
    pub yaw: f32,
    pub pitch: f32,
    pub sensitivity: f32,
}

impl Default for MouseLook {
    fn default() -> Self {
        Self { yaw: MOUSE_START_YAW_DEG, pitch: 0.0, sensitivity: MOUSE_SENSITIVITY }
    }
}

impl MouseLook {
    /// `dy` grows downward on screen, so it lowers the pitch.
    pub fn apply(&mut self, camera: &mut Camera, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity).clamp(-MOUSE_PITCH_LIMIT_DEG, MOUSE_PITCH_LIMIT_DEG);
        camera.set_orientation(self.pitch, self.yaw);
    }
}

/// Maps held keys onto scene mutations, once per frame.
#[derive(Debug, Clone, Default)]
pub struct InputTranslator {
    pub bindings: KeyBindings,
}

impl InputTranslator {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn is_quit(&self, key: KeyCode) -> bool {
        self.bindings.action(key) == Some(Action::Quit)
    }

    /// True when any held key is bound to `action`.
    pub fn is_held(&self, input: &InputState, action: Action) -> bool {
        input.pressed_keys.iter().any(|k| self.bindings.action(*k) == Some(action))
    }

    /// Held actions in a stable order so several keys compose the same way every frame.
    pub fn held_actions<'a>(&'a self, input: &'a InputState) -> impl Iterator<Item = Action> + 'a {
        ACTION_ORDER.into_iter().filter(move |action| self.is_held(input, *action))
    }

    pub fn apply(&self, input: &InputState, scene: &mut SceneState) {
        for action in self.held_actions(input) {
            apply_action(action, scene);
        }
    }
}

/// Order in which held actions are applied within a frame.
const ACTION_ORDER: [Action; 16] = [
    Action::Move(MoveDirection::Forward),
    Action::Move(MoveDirection::Backward),
    Action::Move(MoveDirection::Left),
    Action::Move(MoveDirection::Right),
    Action::Move(MoveDirection::Up),
    Action::Move(MoveDirection::Down),
    Action::RotateObjectsLeft,
    Action::RotateObjectsRight,
    Action::FogThicker,
    Action::FogThinner,
    Action::SunBackward,
    Action::SunForward,
    Action::Polygon(PolygonMode::Fill),
    Action::Polygon(PolygonMode::Point),
    Action::Polygon(PolygonMode::Line),
    Action::Quit,
];

pub fn apply_action(action: Action, scene: &mut SceneState) {
    match action {
        Action::Move(direction) => scene.camera.move_dir(direction, CAMERA_MOVE_SPEED),
        Action::RotateObjectsLeft => scene.object_yaw -= OBJECT_YAW_STEP_DEG,
        Action::RotateObjectsRight => scene.object_yaw += OBJECT_YAW_STEP_DEG,
        Action::FogThicker => scene.fog.thicken(),
        Action::FogThinner => scene.fog.thin(),
        Action::SunForward => {
            let step = scene.lighting.config().manual_step_deg;
            scene.animation.scrub_skybox(step);
            scene.lighting.rotate(-step);
        }
        Action::SunBackward => {
            let step = scene.lighting.config().manual_step_deg;
            scene.animation.scrub_skybox(-step);
            scene.lighting.rotate(step);
        }
        Action::Polygon(mode) => {
            if scene.polygon_mode != mode {
                tracing::debug!(?mode, "polygon mode changed");
            }
            scene.polygon_mode = mode;
        }
        // Quit is handled on key press by the window loop
        Action::Quit => {}
    }
}
