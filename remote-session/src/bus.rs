//! Typed publish/subscribe for device notifications
//!
//! The bus is owned by the session worker, so [`NotificationBus::publish`]
//! always runs on that single thread: handlers never race each other and
//! see events in the order the device connection delivered them.
//!
//! A failing handler (error or panic) is logged and skipped; the remaining
//! handlers still receive the event. The bus keeps no history, so a handler
//! registered late or a reconnect never replays anything.

use std::panic::{self, AssertUnwindSafe};

use remote_core::{DeviceEvent, EventKind};

/// Error a handler may return
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Callback invoked for each matching event
pub type EventHandler = Box<dyn FnMut(&DeviceEvent) -> Result<(), HandlerError> + Send>;

/// Identifies one registration, for [`NotificationBus::unsubscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

struct Registration {
    id: SubscriptionId,
    kind: EventKind,
    handler: EventHandler,
}

/// Fan-out of device events to registered handlers
#[derive(Default)]
pub struct NotificationBus {
    registrations: Vec<Registration>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`
    ///
    /// Registering the same id twice replaces the earlier handler.
    pub fn subscribe(&mut self, id: SubscriptionId, kind: EventKind, handler: EventHandler) {
        self.registrations.retain(|r| r.id != id);
        self.registrations.push(Registration { id, kind, handler });
        tracing::debug!("Subscribed {:?} to {:?}", id, kind);
    }

    /// Remove a registration; returns whether it existed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        before != self.registrations.len()
    }

    /// Number of handlers registered for `kind`
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.registrations.iter().filter(|r| r.kind == kind).count()
    }

    /// Deliver `event` once to every handler registered for its kind
    ///
    /// Returns the number of handlers that completed successfully.
    pub fn publish(&mut self, event: &DeviceEvent) -> usize {
        let kind = event.kind();
        let mut delivered = 0;

        for registration in self.registrations.iter_mut().filter(|r| r.kind == kind) {
            let handler = &mut registration.handler;
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    tracing::warn!(
                        "Handler {:?} failed on {:?} event: {}",
                        registration.id,
                        kind,
                        e
                    );
                }
                Err(_) => {
                    tracing::warn!("Handler {:?} panicked on {:?} event", registration.id, kind);
                }
            }
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> EventHandler {
        let log = Arc::clone(log);
        Box::new(move |event| {
            log.lock().unwrap().push(format!("{}:{:?}", tag, event.kind()));
            Ok(())
        })
    }

    #[test]
    fn test_delivers_only_matching_kind() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = NotificationBus::new();
        bus.subscribe(SubscriptionId::new(1), EventKind::VolumeChange, recorder(&log, "vol"));
        bus.subscribe(SubscriptionId::new(2), EventKind::Progress, recorder(&log, "prog"));

        let delivered = bus.publish(&DeviceEvent::VolumeChange { level: 10 });

        assert_eq!(delivered, 1);
        assert_eq!(*log.lock().unwrap(), vec!["vol:VolumeChange".to_string()]);
    }

    #[test]
    fn test_failing_handler_does_not_block_others() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = NotificationBus::new();
        bus.subscribe(
            SubscriptionId::new(1),
            EventKind::VolumeChange,
            Box::new(|_| Err("boom".into())),
        );
        bus.subscribe(
            SubscriptionId::new(2),
            EventKind::VolumeChange,
            Box::new(|_| panic!("handler bug")),
        );
        bus.subscribe(SubscriptionId::new(3), EventKind::VolumeChange, recorder(&log, "ok"));

        let delivered = bus.publish(&DeviceEvent::VolumeChange { level: 10 });

        assert_eq!(delivered, 1);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_receipt_order_preserved() {
        let levels = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&levels);
        let mut bus = NotificationBus::new();
        bus.subscribe(
            SubscriptionId::new(1),
            EventKind::VolumeChange,
            Box::new(move |event| {
                if let DeviceEvent::VolumeChange { level } = event {
                    sink.lock().unwrap().push(*level);
                }
                Ok(())
            }),
        );

        for level in [5, 3, 9, 1] {
            bus.publish(&DeviceEvent::VolumeChange { level });
        }

        assert_eq!(*levels.lock().unwrap(), vec![5, 3, 9, 1]);
    }

    #[test]
    fn test_unsubscribe() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = NotificationBus::new();
        let id = SubscriptionId::new(7);
        bus.subscribe(id, EventKind::SourceChange, recorder(&log, "src"));
        assert_eq!(bus.handler_count(EventKind::SourceChange), 1);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.handler_count(EventKind::SourceChange), 0);
    }

    #[test]
    fn test_resubscribe_same_id_replaces() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = NotificationBus::new();
        let id = SubscriptionId::new(1);
        bus.subscribe(id, EventKind::VolumeChange, recorder(&log, "first"));
        bus.subscribe(id, EventKind::VolumeChange, recorder(&log, "second"));

        bus.publish(&DeviceEvent::VolumeChange { level: 1 });

        assert_eq!(*log.lock().unwrap(), vec!["second:VolumeChange".to_string()]);
    }
}
