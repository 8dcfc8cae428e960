use std::sync::Arc;

use cozy_icon::RenderedIcon;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{LatLng, MarkerOptions, NativeMarkerId};

/// The icon handed to the native marker. The rendered bitmap is shared read-only with the icon cache.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerIcon {
    /// the map's own pin
    Default,
    Bitmap(Arc<RenderedIcon>),
}

/// The part of a native map sdk the registry drives.
pub trait MapSdk {
    fn add_marker(
        &mut self,
        position: LatLng,
        options: &MarkerOptions,
        icon: MarkerIcon,
    ) -> NativeMarkerId;
    fn set_position(&mut self, id: &NativeMarkerId, position: LatLng);
    fn set_options(&mut self, id: &NativeMarkerId, options: &MarkerOptions);
    fn set_icon(&mut self, id: &NativeMarkerId, icon: MarkerIcon);
    /// false if the map did not know this marker
    fn remove_marker(&mut self, id: &NativeMarkerId) -> bool;
    fn show_info_window(&mut self, id: &NativeMarkerId);
    fn hide_info_window(&mut self, id: &NativeMarkerId);
    fn is_info_window_shown(&self, id: &NativeMarkerId) -> bool;
}

/// Interaction callbacks coming out of the native map, keyed by native id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum NativeEvent {
    #[serde(rename_all = "camelCase")]
    MarkerTap { native_id: NativeMarkerId },
    #[serde(rename_all = "camelCase")]
    MarkerDragStart {
        native_id: NativeMarkerId,
        position: LatLng,
    },
    #[serde(rename_all = "camelCase")]
    MarkerDrag {
        native_id: NativeMarkerId,
        position: LatLng,
    },
    #[serde(rename_all = "camelCase")]
    MarkerDragEnd {
        native_id: NativeMarkerId,
        position: LatLng,
    },
    #[serde(rename_all = "camelCase")]
    InfoWindowTap { native_id: NativeMarkerId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMarker {
    pub position: LatLng,
    pub options: MarkerOptions,
    pub icon: MarkerIcon,
}

/// An in-memory map. It behaves like the google maps sdk where it matters to the registry:
/// 1. ids are `m0`, `m1`, ... and are never reused
/// 2. an info window only opens for markers with a title
/// 3. at most one info window is open at a time
#[derive(Debug, Default)]
pub struct HeadlessMap {
    markers: IndexMap<NativeMarkerId, HeadlessMarker>,
    next_id: u64,
    open_info_window: Option<NativeMarkerId>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn marker(&self, id: &NativeMarkerId) -> Option<&HeadlessMarker> {
        self.markers.get(id)
    }
    pub fn markers(&self) -> impl Iterator<Item = (&NativeMarkerId, &HeadlessMarker)> {
        self.markers.iter()
    }
    pub fn len(&self) -> usize {
        self.markers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl MapSdk for HeadlessMap {
    fn add_marker(
        &mut self,
        position: LatLng,
        options: &MarkerOptions,
        icon: MarkerIcon,
    ) -> NativeMarkerId {
        let id = NativeMarkerId(format!("m{}", self.next_id));
        self.next_id += 1;
        self.markers.insert(
            id.clone(),
            HeadlessMarker {
                position,
                options: options.clone(),
                icon,
            },
        );
        id
    }

    fn set_position(&mut self, id: &NativeMarkerId, position: LatLng) {
        if let Some(marker) = self.markers.get_mut(id) {
            marker.position = position;
        }
    }

    fn set_options(&mut self, id: &NativeMarkerId, options: &MarkerOptions) {
        if let Some(marker) = self.markers.get_mut(id) {
            marker.options = options.clone();
        }
        if !options.visible && self.open_info_window.as_ref() == Some(id) {
            self.open_info_window = None;
        }
    }

    fn set_icon(&mut self, id: &NativeMarkerId, icon: MarkerIcon) {
        if let Some(marker) = self.markers.get_mut(id) {
            marker.icon = icon;
        }
    }

    fn remove_marker(&mut self, id: &NativeMarkerId) -> bool {
        if self.open_info_window.as_ref() == Some(id) {
            self.open_info_window = None;
        }
        self.markers.shift_remove(id).is_some()
    }

    fn show_info_window(&mut self, id: &NativeMarkerId) {
        let Some(marker) = self.markers.get(id) else {
            return;
        };
        if marker.options.info_window.title.is_some() && marker.options.visible {
            self.open_info_window = Some(id.clone());
        }
    }

    fn hide_info_window(&mut self, id: &NativeMarkerId) {
        if self.open_info_window.as_ref() == Some(id) {
            self.open_info_window = None;
        }
    }

    fn is_info_window_shown(&self, id: &NativeMarkerId) -> bool {
        self.open_info_window.as_ref() == Some(id)
    }
}
