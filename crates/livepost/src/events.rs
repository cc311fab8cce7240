//! Save lifecycle notifications.
//!
//! Each successful save emits exactly one event carrying the setting's
//! formatted identity. The dispatcher keeps a request-scoped log (so callers
//! can count what fired, the way the original host's action counter works)
//! and invokes any registered listeners synchronously.

use std::cell::RefCell;
use std::fmt;

/// A lifecycle notification emitted by the save coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A postmeta setting was persisted.
    PostmetaSaved { setting_id: String },
    /// A record-field setting was persisted.
    PostSaved { setting_id: String },
}

impl Event {
    pub fn setting_id(&self) -> &str {
        match self {
            Event::PostmetaSaved { setting_id } | Event::PostSaved { setting_id } => setting_id,
        }
    }
}

type Listener = Box<dyn Fn(&Event)>;

#[derive(Default)]
pub struct EventDispatcher {
    log: RefCell<Vec<Event>>,
    listeners: RefCell<Vec<Listener>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&Event) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    pub fn emit(&self, event: Event) {
        tracing::info!(setting_id = event.setting_id(), "setting saved");
        for listener in self.listeners.borrow().iter() {
            listener(&event);
        }
        self.log.borrow_mut().push(event);
    }

    /// Everything emitted so far this request.
    pub fn log(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    /// How many emitted events satisfy `predicate`.
    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.log.borrow().iter().filter(|e| predicate(e)).count()
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("log", &self.log.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn emit_logs_and_notifies() {
        let dispatcher = EventDispatcher::new();
        let seen = Rc::new(Cell::new(0));
        let seen_by_listener = Rc::clone(&seen);
        dispatcher.subscribe(move |_| seen_by_listener.set(seen_by_listener.get() + 1));

        dispatcher.emit(Event::PostmetaSaved {
            setting_id: "postmeta[post][1][food]".into(),
        });
        dispatcher.emit(Event::PostSaved {
            setting_id: "post[post][1][post_date]".into(),
        });

        assert_eq!(seen.get(), 2);
        assert_eq!(dispatcher.log().len(), 2);
        assert_eq!(
            dispatcher.count(|e| matches!(e, Event::PostmetaSaved { .. })),
            1
        );
    }

    #[test]
    fn count_filters_by_setting() {
        let dispatcher = EventDispatcher::new();
        dispatcher.emit(Event::PostmetaSaved {
            setting_id: "postmeta[post][1][food]".into(),
        });

        assert_eq!(
            dispatcher.count(|e| e.setting_id() == "postmeta[post][1][food]"),
            1
        );
        assert_eq!(
            dispatcher.count(|e| e.setting_id() == "postmeta[post][2][food]"),
            0
        );
    }
}
