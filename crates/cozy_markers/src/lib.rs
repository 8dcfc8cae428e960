//! Marker bookkeeping between a native map and the host app.
//!
//! The host talks in app marker ids and json descriptors. The map talks in its own native ids.
//! [MarkerRegistry] sits in between: it renders badges with [cozy_icon], places native markers,
//! remembers which native marker belongs to which app id and sends interaction events back.

mod channel;
mod descriptor;
mod dispatch;
mod error;
mod id_map;
mod map;
mod registry;

pub use channel::{HostChannel, OutboundEvent, RecordingChannel};
pub use descriptor::{
    Anchor, Badge, InfoWindow, Label, LatLng, MarkerDescriptor, MarkerOptions, MarkerPatch,
};
pub use dispatch::{MethodCall, MethodDispatcher, MethodReply};
pub use error::MarkerError;
pub use id_map::{MarkerHandle, MarkerIdMap, NativeMarkerId};
pub use map::{HeadlessMap, HeadlessMarker, MapSdk, MarkerIcon, NativeEvent};
pub use registry::{MarkerRegistry, MarkerState, RegistryConfig, UnknownIdPolicy};

pub use cozy_icon::BadgeKind;
