//! The logic thread.
//!
//! Runs `Scene::update` on the active scene at the target tick rate until the
//! engine stops. An interrupted sleep restarts the loop from scratch (fresh
//! clock, empty delta window) instead of ending it.

use std::io;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use crate::core::engine::EngineHandle;
use crate::core::timing::{DeltaWindow, Interrupted, LoopClock, Tick};

pub const THREAD_NAME: &str = "simple2d-update";

pub(crate) fn spawn(handle: EngineHandle) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || supervise(&handle))
}

fn supervise(handle: &EngineHandle) {
    handle.shared.interrupt.register_current();
    debug!("Update loop started");

    while handle.is_running() {
        match run(handle) {
            Ok(()) => break,
            // stop() interrupts the sleep to wake us, that is not a restart
            Err(Interrupted) if !handle.is_running() => break,
            Err(Interrupted) => {
                let restarts = handle.shared.update_restarts.fetch_add(1, Ordering::Relaxed) + 1;
                warn!("Update loop was interrupted, restarting it (restart #{})", restarts);
            }
        }
    }

    debug!("Update loop stopped");
}

fn run(handle: &EngineHandle) -> Result<(), Interrupted> {
    let shared = &handle.shared;
    let mut clock = LoopClock::start();
    let mut window = DeltaWindow::new();

    while handle.is_running() {
        let tick = Tick::new(clock.lap(), handle.target_tps());
        window.record(tick.elapsed_secs());

        if let Some(duration) = tick.sleep_request() {
            shared.interrupt.sleep(duration)?;
        }
        shared.tps.store(tick.measured_rate());

        // queued scene switches are applied inside update_active
        shared.scenes.update_active(window.delta(), &shared.input, handle);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::InputState;
    use crate::core::scene::tests::{new_log, Call, Recorder};
    use crate::core::scene::{Scene, SceneId};
    use crate::display::graphics::Graphics;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        condition()
    }

    #[test]
    fn interrupted_loop_restarts_and_keeps_updating() {
        let log = new_log();
        let handle = EngineHandle::detached();
        handle.set_target_tps(200.0);
        handle.scenes().register(Recorder::boxed(1, &log)).unwrap();
        handle.scenes().enter_scene(1).unwrap();
        handle.shared.running.store(true, Ordering::SeqCst);

        let thread = spawn(handle.clone()).unwrap();
        assert!(wait_until(Duration::from_secs(2), || log
            .lock()
            .unwrap()
            .contains(&Call::Update(1))));

        handle.interrupt_update();
        assert!(wait_until(Duration::from_secs(2), || handle.update_restarts() == 1));

        let before = log.lock().unwrap().len();
        assert!(wait_until(Duration::from_secs(2), || log.lock().unwrap().len() > before));
        assert!(!thread.is_finished());

        handle.stop();
        handle.interrupt_update();
        thread.join().unwrap();
        assert_eq!(handle.update_restarts(), 1);
    }

    #[test]
    fn measured_tps_is_published() {
        let handle = EngineHandle::detached();
        handle.set_target_tps(100.0);
        handle.shared.running.store(true, Ordering::SeqCst);
        let thread = spawn(handle.clone()).unwrap();

        assert!(wait_until(Duration::from_secs(2), || handle.tps() > 0.0));
        handle.stop();
        thread.join().unwrap();
        assert!(handle.tps() <= 100.0 + 1e-6);
    }

    #[test]
    fn loop_exits_when_not_running() {
        let handle = EngineHandle::detached();
        let thread = spawn(handle.clone()).unwrap();
        thread.join().unwrap();
        assert_eq!(handle.update_restarts(), 0);
    }

    /// Records every `dt` it is handed, tagged with the restart count.
    struct DeltaRecorder {
        deltas: Arc<Mutex<Vec<(usize, f64)>>>,
    }

    impl Scene for DeltaRecorder {
        fn id(&self) -> SceneId {
            1
        }
        fn update(&self, dt: f64, _input: &InputState, engine: &EngineHandle) {
            self.deltas
                .lock()
                .unwrap()
                .push((engine.update_restarts(), dt));
        }
        fn render(&self, _graphics: &mut Graphics<'_>) {}
    }

    fn median(values: &[f64]) -> f64 {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        sorted[sorted.len() / 2]
    }

    type Deltas = Arc<Mutex<Vec<(usize, f64)>>>;

    fn running_with_recorder(tps: f64) -> (EngineHandle, Deltas) {
        let deltas = Arc::new(Mutex::new(Vec::new()));
        let handle = EngineHandle::detached();
        handle.set_target_tps(tps);
        handle
            .scenes()
            .register(Box::new(DeltaRecorder {
                deltas: Arc::clone(&deltas),
            }))
            .unwrap();
        handle.scenes().enter_scene(1).unwrap();
        handle.shared.running.store(true, Ordering::SeqCst);
        (handle, deltas)
    }

    fn deltas_of_run(deltas: &Deltas, run: usize) -> Vec<f64> {
        deltas
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r == run)
            .map(|(_, dt)| *dt)
            .collect()
    }

    #[test]
    fn scenes_receive_the_sum_of_the_last_two_ticks() {
        let (handle, deltas) = running_with_recorder(100.0);
        let thread = spawn(handle.clone()).unwrap();
        assert!(wait_until(Duration::from_secs(5), || deltas.lock().unwrap().len() >= 22));
        handle.stop();
        handle.interrupt_update();
        thread.join().unwrap();

        let deltas = deltas_of_run(&deltas, 0);
        // the first tick only has one sample in the window
        assert!(deltas[0] < deltas[2]);
        // two periods of 10ms each; a single sample would be about 0.01
        let steady = median(&deltas[2..22]);
        assert!(steady >= 0.018 && steady < 0.1, "steady dt {}", steady);
    }

    #[test]
    fn restart_starts_from_an_empty_delta_window() {
        let (handle, deltas) = running_with_recorder(50.0);
        let thread = spawn(handle.clone()).unwrap();
        assert!(wait_until(Duration::from_secs(5), || deltas.lock().unwrap().len() >= 5));

        handle.interrupt_update();
        assert!(wait_until(Duration::from_secs(5), || deltas_of_run(&deltas, 1).len() >= 6));

        handle.stop();
        handle.interrupt_update();
        thread.join().unwrap();

        let before = deltas_of_run(&deltas, 0);
        let after = deltas_of_run(&deltas, 1);
        assert!(median(&before[2..]) >= 0.036);
        // the restarted loop sees a single near-zero sample first
        assert!(after[0] < 0.01, "first dt after restart {}", after[0]);
        assert!(median(&after[2..]) >= 0.036);
    }
}
