use crossbeam_channel::{unbounded, Receiver, Sender};
use haulplan_core::{Bounds, Coord, GeoPoint, LegId, LocationRole, TripId};
use serde::{Deserialize, Serialize};

pub mod telemetry;

/// Where a leg selection came from. Both surfaces converge on the same state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SelectionOrigin {
    LegList,
    MapMarker,
    MapPath,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    // Notifications
    ShowInfo {
        message: String,
    },
    ShowSuccess {
        message: String,
    },
    ShowWarning {
        message: String,
    },
    ShowError {
        message: String,
    },

    // ========================================================================
    // Map viewport commands
    // ========================================================================
    /// Fit the map to `bounds`, leaving `padding_px` on every side.
    MapFitBounds {
        bounds: Bounds,
        padding_px: u32,
    },
    /// Re-center without touching the zoom level.
    MapPanTo {
        center: Coord,
    },

    // ========================================================================
    // Leg list commands
    // ========================================================================
    LegListScrollTo {
        leg: LegId,
    },
    LegHighlight {
        leg: Option<LegId>,
    },

    // ========================================================================
    // Trip reveal
    // ========================================================================
    TripLoaded {
        trip: TripId,
        leg_count: usize,
    },
    LegRevealed {
        trip: TripId,
        visible: usize,
    },
    RevealComplete {
        trip: TripId,
    },

    // ========================================================================
    // Selection
    // ========================================================================
    LegSelected {
        leg: LegId,
        origin: SelectionOrigin,
    },
    SelectionCleared,

    // ========================================================================
    // Location picker
    // ========================================================================
    DrawerOpened {
        role: LocationRole,
        center: Coord,
    },
    DrawerClosed,
    LocationCommitted {
        role: LocationRole,
        point: GeoPoint,
    },
    LocationCleared {
        role: LocationRole,
    },

    // ========================================================================
    // Geocode search
    // ========================================================================
    SearchResultsChanged {
        query: String,
        count: usize,
    },
    SearchFailed {
        error: String,
    },

    // ========================================================================
    // Trip planning
    // ========================================================================
    TripSubmitted,
    TripPlanFailed {
        error: String,
    },
    TripReset,

    // ========================================================================
    // Log sheets
    // ========================================================================
    LogSheetsReady {
        trip: TripId,
        svg_urls: Vec<String>,
    },
    LogPdfDownloaded {
        trip: TripId,
        file_name: String,
        bytes: Vec<u8>,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(Event::ShowInfo {
            message: message.into(),
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(Event::ShowSuccess {
            message: message.into(),
        });
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.publish(Event::ShowWarning {
            message: message.into(),
        });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Event::ShowError {
            message: message.into(),
        });
    }

    /// Take everything queued so far without blocking.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }

    /// Dispatch all pending events to a listener.
    /// This is useful for processing events in the UI loop.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }
}

/// Trait for components that respond to events.
/// Implement this to receive events from the EventBus.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_publish_receive() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let receiver = bus.receiver();

        sender
            .send(Event::LegSelected {
                leg: LegId(2),
                origin: SelectionOrigin::MapMarker,
            })
            .unwrap();

        match receiver.recv().unwrap() {
            Event::LegSelected { leg, origin } => {
                assert_eq!(leg, LegId(2));
                assert_eq!(origin, SelectionOrigin::MapMarker);
            }
            other => panic!("Expected LegSelected, got {other:?}"),
        }
    }

    #[test]
    fn test_reveal_events_keep_order() {
        let bus = EventBus::new();
        bus.publish(Event::TripLoaded {
            trip: TripId(1),
            leg_count: 2,
        });
        bus.publish(Event::LegRevealed {
            trip: TripId(1),
            visible: 1,
        });
        bus.publish(Event::LegRevealed {
            trip: TripId(1),
            visible: 2,
        });
        bus.publish(Event::RevealComplete { trip: TripId(1) });

        let visible: Vec<usize> = bus
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                Event::LegRevealed { visible, .. } => Some(visible),
                _ => None,
            })
            .collect();
        assert_eq!(visible, vec![1, 2]);
        assert!(bus.drain().is_empty());
    }

    struct Counter {
        warnings: usize,
    }

    impl EventListener for Counter {
        fn handle_event(&mut self, event: &Event) {
            if matches!(event, Event::ShowWarning { .. }) {
                self.warnings += 1;
            }
        }
    }

    #[test]
    fn test_dispatch_to_listener() {
        let bus = EventBus::new();
        bus.warn("Please set current, pickup, and dropoff locations.");
        bus.info("ignored");
        bus.warn("again");

        let mut counter = Counter { warnings: 0 };
        bus.dispatch_to(&mut counter);
        assert_eq!(counter.warnings, 2);
    }

    #[test]
    fn test_events_serialize() {
        let json = serde_json::to_string(&Event::MapPanTo {
            center: Coord::new(40.0, -76.0),
        })
        .unwrap();
        assert_eq!(json, r#"{"MapPanTo":{"center":{"lat":40.0,"lon":-76.0}}}"#);
    }
}
