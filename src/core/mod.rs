pub mod color;
pub mod engine;
pub mod entity;
pub mod input;
pub mod scene;
pub mod texture;
pub mod timing;
pub mod update_loop;

pub use color::Color;
pub use engine::{Engine, EngineConfig, EngineHandle};
pub use entity::{ControlKeys, Entity, EntityBehavior, Player};
pub use input::{InputEvent, InputState, Key, MouseButton};
pub use scene::{Scene, SceneId, SceneRef, SceneRegistry};
pub use texture::{load_texture, Texture, TextureFilter};
