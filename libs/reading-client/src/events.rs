//! The seam between the host shell and the reading features.
//!
//! The host emits [`HostEvent`]s as things happen and routes every jump
//! inside a discussion through [`HostBus::before_jump`]. Handlers observe
//! events and may veto a jump; they never reach into the host otherwise.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::position::VisibleItem;

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The discussion view scrolled.
    PositionChanged {
        discussion_id: i64,
        /// Whatever the host reported about the new position: a bare post
        /// number or an object carrying one.
        signal: Value,
        /// Current location (path and query) of the view.
        location: Option<String>,
        /// Rendered posts with their boxes in viewport coordinates.
        visible: Vec<VisibleItem>,
        viewport_top: f64,
    },
    /// An API request issued by the host finished.
    RequestCompleted {
        method: String,
        url: String,
        status: u16,
        body: Value,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTarget {
    /// The reply composer's "go to latest" jump.
    Latest,
    Number(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpRequest {
    pub discussion_id: i64,
    /// The discussion's last post number as the host knows it.
    pub last_post_number: Option<u32>,
    pub target: JumpTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpDecision {
    Pass,
    Swallow,
}

pub trait HostHandler: Send + Sync {
    fn on_event(&self, _event: &HostEvent) {}

    fn before_jump(&self, _request: &JumpRequest) -> JumpDecision {
        JumpDecision::Pass
    }
}

#[derive(Default)]
pub struct HostBus {
    handlers: RwLock<Vec<Arc<dyn HostHandler>>>,
}

impl HostBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: Arc<dyn HostHandler>) {
        self.handlers.write().push(handler);
    }

    pub fn emit(&self, event: &HostEvent) {
        for handler in self.snapshot() {
            handler.on_event(event);
        }
    }

    /// Ask every handler in subscription order; the first `Swallow` wins and
    /// later handlers are not consulted.
    pub fn before_jump(&self, request: &JumpRequest) -> JumpDecision {
        for handler in self.snapshot() {
            if handler.before_jump(request) == JumpDecision::Swallow {
                return JumpDecision::Swallow;
            }
        }
        JumpDecision::Pass
    }

    fn snapshot(&self) -> Vec<Arc<dyn HostHandler>> {
        self.handlers.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counting {
        events: AtomicUsize,
        jumps: AtomicUsize,
        swallow: bool,
    }

    impl HostHandler for Counting {
        fn on_event(&self, _event: &HostEvent) {
            self.events.fetch_add(1, Ordering::SeqCst);
        }

        fn before_jump(&self, _request: &JumpRequest) -> JumpDecision {
            self.jumps.fetch_add(1, Ordering::SeqCst);
            if self.swallow {
                JumpDecision::Swallow
            } else {
                JumpDecision::Pass
            }
        }
    }

    fn jump() -> JumpRequest {
        JumpRequest {
            discussion_id: 1,
            last_post_number: Some(3),
            target: JumpTarget::Latest,
        }
    }

    #[test]
    fn events_reach_every_handler() {
        let bus = HostBus::new();
        let a = Arc::new(Counting::default());
        let b = Arc::new(Counting::default());
        bus.subscribe(a.clone());
        bus.subscribe(b.clone());

        bus.emit(&HostEvent::RequestCompleted {
            method: "GET".into(),
            url: "/api/v1/ping".into(),
            status: 200,
            body: Value::Null,
        });

        assert_eq!(a.events.load(Ordering::SeqCst), 1);
        assert_eq!(b.events.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn first_swallow_short_circuits() {
        let bus = HostBus::new();
        let swallowing = Arc::new(Counting {
            swallow: true,
            ..Default::default()
        });
        let later = Arc::new(Counting::default());
        bus.subscribe(swallowing.clone());
        bus.subscribe(later.clone());

        assert_eq!(bus.before_jump(&jump()), JumpDecision::Swallow);
        assert_eq!(later.jumps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_bus_passes() {
        assert_eq!(HostBus::new().before_jump(&jump()), JumpDecision::Pass);
    }
}
