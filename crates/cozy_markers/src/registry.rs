use cozy_icon::{IconCache, IconError, IconRenderer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, warn};

use crate::{
    Badge, HostChannel, LatLng, MapSdk, MarkerDescriptor, MarkerError, MarkerHandle, MarkerIcon,
    MarkerIdMap, MarkerOptions, MarkerPatch, NativeEvent, NativeMarkerId, OutboundEvent,
};

/// What `update` and `remove` do when the id is not on the map.
/// Queries like `show_info_window` always fail and native callbacks are always dropped, whatever the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownIdPolicy {
    /// do nothing
    #[default]
    Lenient,
    /// fail with [MarkerError::UnknownMarker]
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub unknown_id_policy: UnknownIdPolicy,
    /// number of rendered icons kept around. 0 disables the cache
    pub icon_cache_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            unknown_id_policy: UnknownIdPolicy::Lenient,
            icon_cache_capacity: IconCache::DEFAULT_CAPACITY,
        }
    }
}

/// What the registry remembers about an active marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerState {
    pub position: LatLng,
    pub badge: Option<Badge>,
    pub options: MarkerOptions,
    pub icon: MarkerIcon,
}

/// Owns the native markers of one map and keeps them in sync with the host's view of them.
///
/// Every marker goes `absent -> active` on `add`, stays active across `update`s and goes back to
/// absent on `remove`. Interaction callbacks from the map are translated back to app ids and
/// forwarded to the host channel.
pub struct MarkerRegistry<M: MapSdk, C: HostChannel> {
    map: M,
    channel: C,
    icons: IconCache,
    markers: MarkerIdMap<MarkerState>,
    config: RegistryConfig,
}

impl<M: MapSdk, C: HostChannel> MarkerRegistry<M, C> {
    pub fn new(map: M, channel: C, renderer: IconRenderer, config: RegistryConfig) -> Self {
        Self {
            map,
            channel,
            icons: IconCache::new(renderer, config.icon_cache_capacity),
            markers: Default::default(),
            config,
        }
    }

    /// Renders the badge and places a new native marker.
    /// An id that is already active is replaced: its old native marker is removed from the map.
    pub fn add(&mut self, descriptor: MarkerDescriptor) -> Result<MarkerHandle, MarkerError> {
        let MarkerDescriptor {
            id,
            position,
            badge,
            options,
        } = descriptor;
        let icon = icon_for(&mut self.icons, badge.as_ref())?;
        if let Some((old, _)) = self.markers.remove(&id) {
            debug!(marker_id = %id, native_id = %old.native_id, "replacing marker");
            self.map.remove_marker(&old.native_id);
        }
        let native_id = self.map.add_marker(position, &options, icon.clone());
        debug!(marker_id = %id, %native_id, ?badge, "added marker");
        let displaced = self.markers.insert(
            id.clone(),
            native_id.clone(),
            MarkerState {
                position,
                badge,
                options,
                icon,
            },
        );
        for (handle, _) in displaced {
            // the map handed out a native id that we still had bound. the marker behind it is gone already
            warn!(?handle, "native marker id was reused by the map");
        }
        Ok(MarkerHandle {
            app_id: id,
            native_id,
        })
    }

    /// Applies the fields present in `patch` to an active marker.
    /// The icon is only rendered again when the badge payload changed.
    /// A failed render leaves the marker untouched.
    pub fn update(&mut self, patch: &MarkerPatch) -> Result<(), MarkerError> {
        let id = patch
            .marker_id
            .as_deref()
            .ok_or(MarkerError::MissingField("markerId"))?;
        let Some((native_id, state)) = self.markers.get_mut(id) else {
            return unknown_id(self.config.unknown_id_policy, "update", id);
        };
        let badge = patch.badge().filter(|badge| state.badge.as_ref() != Some(badge));
        let icon = match badge.as_ref() {
            Some(badge) => Some(icon_for(&mut self.icons, Some(badge))?),
            None => None,
        };

        if let Some(position) = patch.position {
            if position != state.position {
                state.position = position;
                self.map.set_position(native_id, position);
            }
        }
        let mut options = state.options.clone();
        options.apply(patch);
        if options != state.options {
            state.options = options;
            self.map.set_options(native_id, &state.options);
        }
        if let Some(icon) = icon {
            debug!(marker_id = id, ?badge, "badge changed");
            state.badge = badge;
            state.icon = icon.clone();
            self.map.set_icon(native_id, icon);
        }
        Ok(())
    }

    /// Returns true if a marker was removed.
    pub fn remove(&mut self, id: &str) -> Result<bool, MarkerError> {
        match self.markers.remove(id) {
            Some((handle, _)) => {
                if !self.map.remove_marker(&handle.native_id) {
                    warn!(?handle, "map did not know the marker it was asked to remove");
                }
                debug!(marker_id = id, "removed marker");
                Ok(true)
            }
            None => unknown_id(self.config.unknown_id_policy, "remove", id).map(|_| false),
        }
    }

    /// Adds every present descriptor. `None` entries are skipped.
    /// Every entry is attempted and the first error is returned.
    pub fn add_all(
        &mut self,
        descriptors: impl IntoIterator<Item = Option<MarkerDescriptor>>,
    ) -> Result<(), MarkerError> {
        let _span = info_span!("add_all").entered();
        first_error(
            descriptors
                .into_iter()
                .flatten()
                .map(|descriptor| self.add(descriptor).map(|_| ()))
                .collect(),
        )
    }

    pub fn update_all(
        &mut self,
        patches: impl IntoIterator<Item = Option<MarkerPatch>>,
    ) -> Result<(), MarkerError> {
        let _span = info_span!("update_all").entered();
        first_error(
            patches
                .into_iter()
                .flatten()
                .map(|patch| self.update(&patch))
                .collect(),
        )
    }

    pub fn remove_all<S: AsRef<str>>(
        &mut self,
        ids: impl IntoIterator<Item = Option<S>>,
    ) -> Result<(), MarkerError> {
        let _span = info_span!("remove_all").entered();
        first_error(
            ids.into_iter()
                .flatten()
                .map(|id| self.remove(id.as_ref()).map(|_| ()))
                .collect(),
        )
    }

    /// Forwards a tap to the host.
    /// Returns true if the tap is consumed, which stops the map from centering the camera and opening the info window.
    pub fn on_tap(&mut self, native_id: &NativeMarkerId) -> bool {
        let Some((app_id, state)) = self.markers.get_by_native(native_id) else {
            debug!(%native_id, "dropping tap on unknown marker");
            return false;
        };
        let consumed = state.options.consume_tap_events;
        let marker_id = app_id.to_owned();
        self.channel
            .invoke_method(OutboundEvent::MarkerTap { marker_id });
        consumed
    }

    pub fn on_drag_start(&mut self, native_id: &NativeMarkerId, position: LatLng) -> bool {
        self.forward_drag(native_id, position, |marker_id, position| {
            OutboundEvent::MarkerDragStart {
                marker_id,
                position,
            }
        })
    }

    pub fn on_drag(&mut self, native_id: &NativeMarkerId, position: LatLng) -> bool {
        self.forward_drag(native_id, position, |marker_id, position| {
            OutboundEvent::MarkerDrag {
                marker_id,
                position,
            }
        })
    }

    pub fn on_drag_end(&mut self, native_id: &NativeMarkerId, position: LatLng) -> bool {
        self.forward_drag(native_id, position, |marker_id, position| {
            OutboundEvent::MarkerDragEnd {
                marker_id,
                position,
            }
        })
    }

    pub fn on_info_window_tap(&mut self, native_id: &NativeMarkerId) -> bool {
        let Some(marker_id) = self.markers.app_id(native_id).map(str::to_owned) else {
            debug!(%native_id, "dropping info window tap on unknown marker");
            return false;
        };
        self.channel
            .invoke_method(OutboundEvent::InfoWindowTap { marker_id });
        true
    }

    /// Routes a native callback to the matching `on_*` method and returns its result.
    pub fn handle_native_event(&mut self, event: &NativeEvent) -> bool {
        match event {
            NativeEvent::MarkerTap { native_id } => self.on_tap(native_id),
            NativeEvent::MarkerDragStart {
                native_id,
                position,
            } => self.on_drag_start(native_id, *position),
            NativeEvent::MarkerDrag {
                native_id,
                position,
            } => self.on_drag(native_id, *position),
            NativeEvent::MarkerDragEnd {
                native_id,
                position,
            } => self.on_drag_end(native_id, *position),
            NativeEvent::InfoWindowTap { native_id } => self.on_info_window_tap(native_id),
        }
    }

    pub fn show_info_window(&mut self, id: &str) -> Result<(), MarkerError> {
        let native_id = self.require_native_id("showInfoWindow", id)?.clone();
        self.map.show_info_window(&native_id);
        Ok(())
    }

    pub fn hide_info_window(&mut self, id: &str) -> Result<(), MarkerError> {
        let native_id = self.require_native_id("hideInfoWindow", id)?.clone();
        self.map.hide_info_window(&native_id);
        Ok(())
    }

    pub fn is_info_window_shown(&self, id: &str) -> Result<bool, MarkerError> {
        let native_id = self.require_native_id("isInfoWindowShown", id)?;
        Ok(self.map.is_info_window_shown(native_id))
    }

    pub fn handle(&self, id: &str) -> Option<MarkerHandle> {
        self.markers.handle(id)
    }
    pub fn native_id(&self, id: &str) -> Option<&NativeMarkerId> {
        self.markers.native_id(id)
    }
    pub fn app_id(&self, native_id: &NativeMarkerId) -> Option<&str> {
        self.markers.app_id(native_id)
    }
    pub fn marker(&self, id: &str) -> Option<&MarkerState> {
        self.markers.get(id).map(|(_, state)| state)
    }
    pub fn contains(&self, id: &str) -> bool {
        self.markers.contains(id)
    }
    pub fn len(&self) -> usize {
        self.markers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(|(id, _, _)| id)
    }
    /// true if the app id and native id lookups agree with each other
    pub fn is_consistent(&self) -> bool {
        self.markers.is_consistent()
    }
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
    pub fn icons(&self) -> &IconCache {
        &self.icons
    }
    pub fn map(&self) -> &M {
        &self.map
    }
    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }
    pub fn channel(&self) -> &C {
        &self.channel
    }
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }
    pub fn into_parts(self) -> (M, C) {
        (self.map, self.channel)
    }

    fn require_native_id(
        &self,
        method: &'static str,
        id: &str,
    ) -> Result<&NativeMarkerId, MarkerError> {
        self.markers
            .native_id(id)
            .ok_or_else(|| MarkerError::InvalidMarkerId {
                method,
                marker_id: id.to_owned(),
            })
    }

    fn forward_drag(
        &mut self,
        native_id: &NativeMarkerId,
        position: LatLng,
        event: impl FnOnce(String, LatLng) -> OutboundEvent,
    ) -> bool {
        let Some(marker_id) = self.markers.app_id(native_id).map(str::to_owned) else {
            debug!(%native_id, "dropping drag on unknown marker");
            return false;
        };
        // the native marker already moved
        if let Some((_, state)) = self.markers.get_mut(&marker_id) {
            state.position = position;
        }
        self.channel.invoke_method(event(marker_id, position));
        true
    }
}

impl<M: MapSdk + std::fmt::Debug, C: HostChannel> std::fmt::Debug for MarkerRegistry<M, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerRegistry")
            .field("map", &self.map)
            .field("markers", &self.markers.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn icon_for(icons: &mut IconCache, badge: Option<&Badge>) -> Result<MarkerIcon, IconError> {
    Ok(match badge {
        Some(badge) => MarkerIcon::Bitmap(icons.get_or_render(badge.kind, &badge.label)?),
        None => MarkerIcon::Default,
    })
}

fn unknown_id(
    policy: UnknownIdPolicy,
    operation: &'static str,
    marker_id: &str,
) -> Result<(), MarkerError> {
    match policy {
        UnknownIdPolicy::Lenient => {
            debug!(operation, marker_id, "ignoring unknown marker id");
            Ok(())
        }
        UnknownIdPolicy::Strict => Err(MarkerError::UnknownMarker {
            operation,
            marker_id: marker_id.to_owned(),
        }),
    }
}

fn first_error(results: Vec<Result<(), MarkerError>>) -> Result<(), MarkerError> {
    let mut first = None;
    for err in results.into_iter().filter_map(Result::err) {
        warn!(?err, "batch entry failed");
        first.get_or_insert(err);
    }
    first.map_or(Ok(()), Err)
}
