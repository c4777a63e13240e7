use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use log::{debug, info, warn};

use crate::core::engine::EngineHandle;
use crate::core::input::InputState;
use crate::display::graphics::Graphics;
use crate::error::SceneError;

pub type SceneId = i32;

/// One screen of the game (menu, level, pause screen, ...).
///
/// `update` runs on the update thread and `render` on the render thread, and
/// the two may run at the same time. Hooks take `&self`: a scene keeps its
/// mutable state behind its own locks and decides how long render holds them.
/// Lifecycle hooks default to no-ops.
///
/// Switching scenes from inside a hook is fine. The switch is queued and
/// performed once the hook returns.
pub trait Scene: Send + Sync {
    fn id(&self) -> SceneId;

    /// `dt` is the smoothed delta time in seconds.
    fn update(&self, dt: f64, input: &InputState, engine: &EngineHandle);

    fn render(&self, graphics: &mut Graphics<'_>);

    /// Called when this scene becomes the active scene.
    fn enter_scene(&self) {}

    /// Called when another scene replaces this one as the active scene.
    fn leave_scene(&self) {}

    /// Called once on engine shutdown, whether or not the scene is active.
    fn exit_scene(&self) {}
}

/// Shared handle to a registered scene.
#[derive(Clone)]
pub struct SceneRef {
    id: SceneId,
    scene: Arc<dyn Scene>,
    in_flight: Arc<InFlight>,
}

/// Number of update/render calls currently running on a scene.
#[derive(Default)]
struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    fn enter(&self) {
        *lock(&self.count) += 1;
    }

    fn exit(&self) {
        let mut count = lock(&self.count);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn wait_idle(&self) {
        let mut count = lock(&self.count);
        while *count > 0 {
            count = self
                .idle
                .wait(count)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}

impl SceneRef {
    pub fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            id: scene.id(),
            scene: Arc::from(scene),
            in_flight: Arc::new(InFlight::default()),
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn ptr_eq(&self, other: &SceneRef) -> bool {
        Arc::ptr_eq(&self.in_flight, &other.in_flight)
    }
}

impl fmt::Debug for SceneRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneRef").field("id", &self.id).finish()
    }
}

/// Registry locks are never held while a hook runs, so a poisoned one still
/// holds consistent data.
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Marks one running dispatch: the scene is busy and the calling thread is
/// inside a hook.
struct Dispatch<'a> {
    registry: &'a SceneRegistry,
    scene: SceneRef,
    thread: ThreadId,
}

impl Drop for Dispatch<'_> {
    fn drop(&mut self) {
        let mut threads = lock(&self.registry.dispatching);
        if let Some(pos) = threads.iter().position(|t| *t == self.thread) {
            threads.swap_remove(pos);
        }
        drop(threads);
        self.scene.in_flight.exit();
    }
}

/// Registered scenes plus the single active scene.
///
/// No lock is held while a hook runs. Update and render of the active scene
/// may overlap; a switch waits until the outgoing scene has no dispatch in
/// flight before calling its `leave_scene`.
#[derive(Default)]
pub struct SceneRegistry {
    scenes: Mutex<Vec<SceneRef>>,
    active: Mutex<Option<SceneRef>>,
    pending: Mutex<Option<SceneRef>>,
    dispatching: Mutex<Vec<ThreadId>>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Registration -----------------------------------------------------

    pub fn register(&self, scene: Box<dyn Scene>) -> Result<SceneRef, SceneError> {
        let scene = SceneRef::new(scene);
        let mut scenes = lock(&self.scenes);
        if scenes.iter().any(|s| s.id == scene.id) {
            return Err(SceneError::DuplicateId(scene.id));
        }
        debug!("Registered scene {}", scene.id);
        scenes.push(scene.clone());
        Ok(scene)
    }

    /// Removes a registration.
    ///
    /// Removing the active scene leaves it active (and dispatched to) until
    /// another scene is entered.
    pub fn remove(&self, id: SceneId) -> Result<SceneRef, SceneError> {
        let removed = {
            let mut scenes = lock(&self.scenes);
            let pos = scenes
                .iter()
                .position(|s| s.id == id)
                .ok_or(SceneError::NotRegistered(id))?;
            scenes.remove(pos)
        };
        if self.active_id() == Some(id) {
            warn!("Removed scene {} while it is active, it stays active until replaced", id);
        }
        debug!("Removed scene {}", id);
        Ok(removed)
    }

    pub fn remove_scene(&self, scene: &SceneRef) -> Result<SceneRef, SceneError> {
        self.remove(scene.id)
    }

    pub fn contains(&self, id: SceneId) -> bool {
        lock(&self.scenes).iter().any(|s| s.id == id)
    }

    pub fn get(&self, id: SceneId) -> Option<SceneRef> {
        lock(&self.scenes).iter().find(|s| s.id == id).cloned()
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<SceneId> {
        lock(&self.scenes).iter().map(|s| s.id).collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.scenes).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    //--- Switching --------------------------------------------------------

    pub fn active_id(&self) -> Option<SceneId> {
        lock(&self.active).as_ref().map(SceneRef::id)
    }

    pub fn active(&self) -> Option<SceneRef> {
        lock(&self.active).clone()
    }

    /// Makes `scene` the active scene.
    ///
    /// The slot is empty from the moment the old scene is taken out until the
    /// new scene has run `enter_scene`, so dispatch in between finds nothing to
    /// do instead of reaching a half-switched scene. Called from inside a
    /// hook, the switch is queued and runs when that hook returns.
    pub fn set_active(&self, scene: SceneRef) {
        if self.in_dispatch() {
            debug!("Switch to scene {} requested from a hook, queued", scene.id);
            *lock(&self.pending) = Some(scene);
            return;
        }

        let previous = lock(&self.active).take();
        if let Some(previous) = previous {
            previous.in_flight.wait_idle();
            previous.scene.leave_scene();
        }
        scene.scene.enter_scene();
        info!("Entered scene {}", scene.id);
        *lock(&self.active) = Some(scene);
    }

    pub fn enter_scene(&self, id: SceneId) -> Result<(), SceneError> {
        let scene = self.get(id).ok_or(SceneError::NotRegistered(id))?;
        self.set_active(scene);
        Ok(())
    }

    /// Queues a switch to `id`, performed after the next dispatch returns.
    ///
    /// The id is checked now, so an unknown scene fails at the call site.
    pub fn request_scene(&self, id: SceneId) -> Result<(), SceneError> {
        let scene = self.get(id).ok_or(SceneError::NotRegistered(id))?;
        *lock(&self.pending) = Some(scene);
        Ok(())
    }

    pub fn pending_scene(&self) -> Option<SceneId> {
        lock(&self.pending).as_ref().map(SceneRef::id)
    }

    /// Performs a queued switch, if any.
    pub fn apply_pending(&self) {
        if self.in_dispatch() {
            return;
        }
        let pending = lock(&self.pending).take();
        if let Some(scene) = pending {
            self.set_active(scene);
        }
    }

    fn in_dispatch(&self) -> bool {
        let current = thread::current().id();
        lock(&self.dispatching).contains(&current)
    }

    /// Claims the active scene for one hook call. The in-flight count is raised
    /// while the slot is locked, so a switch that empties the slot afterwards
    /// is guaranteed to see it.
    fn begin_dispatch(&self) -> Option<Dispatch<'_>> {
        let scene = {
            let active = lock(&self.active);
            let scene = active.as_ref()?.clone();
            scene.in_flight.enter();
            scene
        };
        let thread = thread::current().id();
        lock(&self.dispatching).push(thread);
        Some(Dispatch {
            registry: self,
            scene,
            thread,
        })
    }

    //--- Dispatch ---------------------------------------------------------

    /// Runs the active scene's `update`, then any switch it queued.
    pub fn update_active(&self, dt: f64, input: &InputState, engine: &EngineHandle) {
        if let Some(dispatch) = self.begin_dispatch() {
            dispatch.scene.scene.update(dt, input, engine);
        }
        self.apply_pending();
    }

    /// Runs the active scene's `render`, then any switch it queued.
    pub fn render_active(&self, graphics: &mut Graphics<'_>) {
        if let Some(dispatch) = self.begin_dispatch() {
            dispatch.scene.scene.render(graphics);
        }
        self.apply_pending();
    }

    //--- Shutdown ---------------------------------------------------------

    /// Runs `exit_scene` on every registered scene, in registration order.
    pub fn exit_all(&self) {
        let scenes = lock(&self.scenes).clone();
        for scene in scenes {
            scene.scene.exit_scene();
        }
    }

    /// Drops all registrations and the active scene.
    pub fn clear(&self) {
        lock(&self.scenes).clear();
        *lock(&self.active) = None;
        *lock(&self.pending) = None;
    }
}

impl fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneRegistry")
            .field("scenes", &self.ids())
            .field("active", &self.active_id())
            .finish()
    }
}
