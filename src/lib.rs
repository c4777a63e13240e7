pub mod audio;
pub mod cli;
pub mod core;
pub mod display;
pub mod error;
pub mod logging;
pub mod ui;

pub use self::core::{
    Color, Engine, EngineConfig, EngineHandle, Entity, EntityBehavior, InputState, Key,
    MouseButton, Player, Scene, SceneId, SceneRegistry, Texture,
};
pub use display::{DisplaySurface, Font, Graphics, WindowConfig};
pub use error::{DisplayError, EngineError, ResourceError, SceneError};
pub use ui::{Background, Button, Label, UiComponent};
