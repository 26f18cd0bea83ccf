use leptos::leptos_dom::helpers::IntervalHandle;
use leptos::set_interval_with_handle;
use log::{debug, error};
use std::cell::Cell;
use std::time::Duration;

/// A fixed-interval browser timer that can be started and stopped explicitly.
///
/// Starting an already running poller is a no-op; dropping it clears the timer.
#[derive(Default)]
pub struct Poller {
    handle: Cell<Option<IntervalHandle>>,
}

impl Poller {
    pub fn start(&self, every: Duration, tick: impl Fn() + 'static) {
        if self.is_running() {
            return;
        }
        match set_interval_with_handle(tick, every) {
            Ok(handle) => {
                debug!("Polling every {every:?}");
                self.handle.set(Some(handle));
            }
            Err(err) => error!("Could not start polling: {err:?}"),
        }
    }

    pub fn stop(&self) {
        if let Some(handle) = self.handle.take() {
            debug!("Polling stopped");
            handle.clear();
        }
    }

    pub fn is_running(&self) -> bool {
        let handle = self.handle.take();
        let running = handle.is_some();
        self.handle.set(handle);
        running
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
