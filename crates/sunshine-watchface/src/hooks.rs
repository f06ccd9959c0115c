//! Platform services the watch face depends on.

use std::sync::Arc;

use chrono_tz::Tz;
use parking_lot::Mutex;

use crate::engine::{EngineEvent, EngineHandle};

/// Time-zone broadcasts and user settings provided by the platform
pub trait SystemHooks: Send {
    /// Start delivering [`EngineEvent::TimeZoneChanged`] to `inbox`
    fn register_time_zone_listener(&mut self, inbox: EngineHandle);

    fn unregister_time_zone_listener(&mut self);

    fn default_time_zone(&self) -> Tz;

    fn is_24_hour_format(&self) -> bool;
}

#[derive(Debug)]
struct HooksState {
    time_zone: Tz,
    use_24_hour: bool,
    listener: Option<EngineHandle>,
    registrations: usize,
    unregistrations: usize,
}

/// Hooks with settings held in memory.
///
/// Clones share state, so a test can keep one clone and change the time
/// zone while the engine owns the other.
#[derive(Debug, Clone)]
pub struct FixedSystemHooks {
    state: Arc<Mutex<HooksState>>,
}

impl FixedSystemHooks {
    pub fn new(time_zone: Tz, use_24_hour: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(HooksState {
                time_zone,
                use_24_hour,
                listener: None,
                registrations: 0,
                unregistrations: 0,
            })),
        }
    }

    pub fn registrations(&self) -> usize {
        self.state.lock().registrations
    }

    pub fn unregistrations(&self) -> usize {
        self.state.lock().unregistrations
    }

    pub fn is_registered(&self) -> bool {
        self.state.lock().listener.is_some()
    }

    pub fn set_24_hour_format(&self, use_24_hour: bool) {
        self.state.lock().use_24_hour = use_24_hour;
    }

    /// Change the system zone and notify the registered listener, if any
    pub fn change_time_zone(&self, time_zone: Tz) {
        let listener = {
            let mut state = self.state.lock();
            state.time_zone = time_zone;
            state.listener.clone()
        };
        if let Some(inbox) = listener {
            inbox.send(EngineEvent::TimeZoneChanged(time_zone));
        }
    }
}

impl SystemHooks for FixedSystemHooks {
    fn register_time_zone_listener(&mut self, inbox: EngineHandle) {
        let mut state = self.state.lock();
        state.listener = Some(inbox);
        state.registrations += 1;
    }

    fn unregister_time_zone_listener(&mut self) {
        let mut state = self.state.lock();
        if state.listener.take().is_some() {
            state.unregistrations += 1;
        }
    }

    fn default_time_zone(&self) -> Tz {
        self.state.lock().time_zone
    }

    fn is_24_hour_format(&self) -> bool {
        self.state.lock().use_24_hour
    }
}
