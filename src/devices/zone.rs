// MIT License - Copyright (c) 2026 Peter Wright
// Zone state and change notification

use std::fmt;
use std::sync::{Arc, Weak};

use bitflags::bitflags;
use parking_lot::RwLock;
use tracing::debug;

use crate::event::PanelEvent;
use crate::panel::PanelShared;

bitflags! {
    /// Zone status nibble as reported in a `ZS` digit.
    ///
    /// The digit is read as a 4-bit value: `1` open, `2` trouble,
    /// `4` alarm, `8` bypassed. `0` is a closed, healthy zone.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ZoneStatusFlags: u8 {
        const OPENED   = 0b0001;
        const TROUBLE  = 0b0010;
        const ALARM    = 0b0100;
        const BYPASSED = 0b1000;
    }
}

impl ZoneStatusFlags {
    /// Parse a single status digit (`0`-`9`, `A`-`F`).
    pub fn from_digit(c: char) -> Option<Self> {
        c.to_digit(16).map(|v| Self::from_bits_truncate(v as u8))
    }

    /// Get the flags that changed between old and new status.
    pub fn changed(old: Self, new: Self) -> Self {
        old ^ new
    }

    /// Human-readable names for the flags in `changed`, as seen in `new`.
    pub fn event_names(changed: Self, new: Self) -> Vec<&'static str> {
        let mut events = Vec::new();
        if changed.contains(Self::OPENED) {
            events.push(if new.contains(Self::OPENED) { "Open" } else { "Closed" });
        }
        if changed.contains(Self::TROUBLE) {
            events.push(if new.contains(Self::TROUBLE) { "Trouble" } else { "TroubleRestore" });
        }
        if changed.contains(Self::ALARM) {
            events.push(if new.contains(Self::ALARM) { "Alarm" } else { "StandBy" });
        }
        if changed.contains(Self::BYPASSED) {
            events.push(if new.contains(Self::BYPASSED) { "Bypassed" } else { "UnBypassed" });
        }
        events
    }
}

/// Change callback. Invoked with no payload; read the zone to see the new state.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

struct ZoneInner {
    id: u32,
    status: RwLock<ZoneStatusFlags>,
    callbacks: RwLock<Vec<Callback>>,
    panel: Weak<PanelShared>,
}

/// A single alarm zone.
///
/// Cheap to clone; all clones share the same state. Zones live as long as the
/// panel that created them and only hold a weak reference back to it.
#[derive(Clone)]
pub struct Zone {
    inner: Arc<ZoneInner>,
}

impl Zone {
    pub(crate) fn new(id: u32, panel: Weak<PanelShared>) -> Self {
        Self {
            inner: Arc::new(ZoneInner {
                id,
                status: RwLock::new(ZoneStatusFlags::empty()),
                callbacks: RwLock::new(Vec::new()),
                panel,
            }),
        }
    }

    pub fn id(&self) -> u32 {
        self.inner.id
    }

    pub fn status(&self) -> ZoneStatusFlags {
        *self.inner.status.read()
    }

    pub fn opened(&self) -> bool {
        self.status().contains(ZoneStatusFlags::OPENED)
    }
    pub fn closed(&self) -> bool {
        !self.opened()
    }
    pub fn trouble(&self) -> bool {
        self.status().contains(ZoneStatusFlags::TROUBLE)
    }
    pub fn alarm(&self) -> bool {
        self.status().contains(ZoneStatusFlags::ALARM)
    }
    pub fn bypassed(&self) -> bool {
        self.status().contains(ZoneStatusFlags::BYPASSED)
    }

    pub fn set_opened(&self, value: bool) -> bool {
        self.set_flag(ZoneStatusFlags::OPENED, value)
    }
    pub fn set_closed(&self, value: bool) -> bool {
        self.set_flag(ZoneStatusFlags::OPENED, !value)
    }
    pub fn set_trouble(&self, value: bool) -> bool {
        self.set_flag(ZoneStatusFlags::TROUBLE, value)
    }
    pub fn set_alarm(&self, value: bool) -> bool {
        self.set_flag(ZoneStatusFlags::ALARM, value)
    }
    pub fn set_bypassed(&self, value: bool) -> bool {
        self.set_flag(ZoneStatusFlags::BYPASSED, value)
    }

    /// Apply a whole status nibble. Returns true if anything changed.
    pub fn process_status(&self, status: ZoneStatusFlags) -> bool {
        self.update(|_| status)
    }

    /// Register a change callback. Callbacks run in registration order and
    /// cannot be removed.
    pub fn register_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.callbacks.write().push(Arc::new(callback));
    }

    /// Partition assignment from the last `ZP` report, if one has arrived
    /// and covers this zone.
    pub fn partition_id(&self) -> Option<char> {
        let panel = self.inner.panel.upgrade()?;
        panel.zone_partition(self.inner.id)
    }

    /// Back to closed with no trouble, alarm or bypass.
    pub(crate) fn reset(&self) -> bool {
        self.update(|_| ZoneStatusFlags::empty())
    }

    pub(crate) fn set_flag(&self, flag: ZoneStatusFlags, value: bool) -> bool {
        self.update(|mut status| {
            status.set(flag, value);
            status
        })
    }

    fn update(&self, f: impl FnOnce(ZoneStatusFlags) -> ZoneStatusFlags) -> bool {
        let (old_status, new_status) = {
            let mut status = self.inner.status.write();
            let old = *status;
            let new = f(old);
            if old == new {
                return false;
            }
            *status = new;
            (old, new)
        };

        let changed = ZoneStatusFlags::changed(old_status, new_status);
        debug!(
            "Zone {} changed: {:?}",
            self.inner.id,
            ZoneStatusFlags::event_names(changed, new_status)
        );

        // Snapshot so callbacks may read the zone or register further callbacks.
        let callbacks: Vec<Callback> = self.inner.callbacks.read().clone();
        for callback in &callbacks {
            callback();
        }

        if let Some(panel) = self.inner.panel.upgrade() {
            panel.emit(PanelEvent::ZoneStatusChanged {
                zone_id: self.inner.id,
                old_status,
                new_status,
                changed,
            });
        }
        true
    }
}

impl fmt::Debug for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zone")
            .field("id", &self.inner.id)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn detached(id: u32) -> Zone {
        Zone::new(id, Weak::new())
    }

    fn counter(zone: &Zone) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        zone.register_callback(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_digit_bit_layout() {
        let flags = ZoneStatusFlags::from_digit('8').unwrap();
        assert_eq!(flags, ZoneStatusFlags::BYPASSED);

        let flags = ZoneStatusFlags::from_digit('5').unwrap();
        assert_eq!(flags, ZoneStatusFlags::ALARM | ZoneStatusFlags::OPENED);

        assert_eq!(ZoneStatusFlags::from_digit('0'), Some(ZoneStatusFlags::empty()));
        assert_eq!(ZoneStatusFlags::from_digit('F'), Some(ZoneStatusFlags::all()));
        assert_eq!(ZoneStatusFlags::from_digit('X'), None);
    }

    #[test]
    fn test_new_zone_is_closed() {
        let zone = detached(1);
        assert!(zone.closed());
        assert!(!zone.opened());
        assert!(!zone.trouble());
        assert!(!zone.alarm());
        assert!(!zone.bypassed());
        assert_eq!(zone.partition_id(), None);
    }

    #[test]
    fn test_process_status_notifies_once() {
        let zone = detached(3);
        let count = counter(&zone);

        let status = ZoneStatusFlags::from_digit('1').unwrap();
        assert!(zone.process_status(status));
        assert!(!zone.process_status(status));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(zone.opened());
    }

    #[test]
    fn test_setters_only_notify_on_change() {
        let zone = detached(2);
        let count = counter(&zone);

        assert!(!zone.set_closed(true));
        assert!(zone.set_trouble(true));
        assert!(!zone.set_trouble(true));
        assert!(zone.set_bypassed(true));
        assert!(zone.set_opened(true));
        assert!(zone.set_closed(true));
        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert_eq!(
            zone.status(),
            ZoneStatusFlags::TROUBLE | ZoneStatusFlags::BYPASSED
        );
    }

    #[test]
    fn test_callbacks_run_in_registration_order() {
        let zone = detached(4);
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = order.clone();
            zone.register_callback(move || order.lock().push(n));
        }
        zone.set_alarm(true);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_callback_sees_new_state() {
        let zone = detached(5);
        let seen = Arc::new(AtomicUsize::new(0));
        let (z, s) = (zone.clone(), seen.clone());
        zone.register_callback(move || {
            if z.opened() {
                s.fetch_add(1, Ordering::SeqCst);
            }
        });
        zone.set_opened(true);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reset() {
        let zone = detached(6);
        zone.process_status(ZoneStatusFlags::all());
        assert!(zone.reset());
        assert!(zone.closed());
        assert!(!zone.reset());
    }

    #[test]
    fn test_event_names() {
        let old = ZoneStatusFlags::OPENED;
        let new = ZoneStatusFlags::TROUBLE;
        let names = ZoneStatusFlags::event_names(ZoneStatusFlags::changed(old, new), new);
        assert_eq!(names, vec!["Closed", "Trouble"]);
    }
}
