use serde_json::{json, Value};

use crate::LatLng;

/// Events sent to the host. Delivery is fire and forget.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    MarkerTap { marker_id: String },
    MarkerDragStart { marker_id: String, position: LatLng },
    MarkerDrag { marker_id: String, position: LatLng },
    MarkerDragEnd { marker_id: String, position: LatLng },
    InfoWindowTap { marker_id: String },
}

impl OutboundEvent {
    pub fn method(&self) -> &'static str {
        match self {
            OutboundEvent::MarkerTap { .. } => "marker#onTap",
            OutboundEvent::MarkerDragStart { .. } => "marker#onDragStart",
            OutboundEvent::MarkerDrag { .. } => "marker#onDrag",
            OutboundEvent::MarkerDragEnd { .. } => "marker#onDragEnd",
            OutboundEvent::InfoWindowTap { .. } => "infoWindow#onTap",
        }
    }

    pub fn marker_id(&self) -> &str {
        match self {
            OutboundEvent::MarkerTap { marker_id }
            | OutboundEvent::MarkerDragStart { marker_id, .. }
            | OutboundEvent::MarkerDrag { marker_id, .. }
            | OutboundEvent::MarkerDragEnd { marker_id, .. }
            | OutboundEvent::InfoWindowTap { marker_id } => marker_id,
        }
    }

    pub fn arguments(&self) -> Value {
        match self {
            OutboundEvent::MarkerTap { marker_id } | OutboundEvent::InfoWindowTap { marker_id } => {
                json!({ "markerId": marker_id })
            }
            OutboundEvent::MarkerDragStart {
                marker_id,
                position,
            }
            | OutboundEvent::MarkerDrag {
                marker_id,
                position,
            }
            | OutboundEvent::MarkerDragEnd {
                marker_id,
                position,
            } => json!({ "markerId": marker_id, "position": [position.lat, position.lng] }),
        }
    }
}

/// The host side of the message channel.
pub trait HostChannel {
    fn invoke_method(&mut self, event: OutboundEvent);
}

impl<F: FnMut(OutboundEvent)> HostChannel for F {
    fn invoke_method(&mut self, event: OutboundEvent) {
        self(event)
    }
}

/// Keeps every event it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    pub events: Vec<OutboundEvent>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn take(&mut self) -> Vec<OutboundEvent> {
        std::mem::take(&mut self.events)
    }
}

impl HostChannel for RecordingChannel {
    fn invoke_method(&mut self, event: OutboundEvent) {
        self.events.push(event);
    }
}
