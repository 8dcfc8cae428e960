//! Marker descriptors as the host sends them.
//!
//! The wire form is a json object with camelCase keys:
//! `{"markerId": "m1", "position": [lat, lng], "count": "5", "draggable": true, ...}`

use cozy_icon::BadgeKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::MarkerError;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}
impl From<[f64; 2]> for LatLng {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}
impl From<LatLng> for [f64; 2] {
    fn from(value: LatLng) -> Self {
        [value.lat, value.lng]
    }
}

/// fractions of the icon size. (0, 0) is the top left, (1, 1) the bottom right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct Anchor {
    pub u: f32,
    pub v: f32,
}
impl Anchor {
    pub const BOTTOM_CENTER: Self = Self { u: 0.5, v: 1.0 };
    pub const TOP_CENTER: Self = Self { u: 0.5, v: 0.0 };
}
impl From<[f32; 2]> for Anchor {
    fn from([u, v]: [f32; 2]) -> Self {
        Self { u, v }
    }
}
impl From<Anchor> for [f32; 2] {
    fn from(value: Anchor) -> Self {
        [value.u, value.v]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoWindow {
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub anchor: Anchor,
}
impl Default for InfoWindow {
    fn default() -> Self {
        Self {
            title: None,
            snippet: None,
            anchor: Anchor::TOP_CENTER,
        }
    }
}

/// The text and the shape of a marker's icon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Badge {
    pub kind: BadgeKind,
    pub label: String,
}

impl Badge {
    pub fn count(label: impl Into<String>) -> Self {
        Self {
            kind: BadgeKind::Count,
            label: label.into(),
        }
    }
    pub fn price(label: impl Into<String>) -> Self {
        Self {
            kind: BadgeKind::Price,
            label: label.into(),
        }
    }
}

/// Every marker option the native marker understands, apart from position and icon.
/// Defaults match the map sdk's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkerOptions {
    pub alpha: f32,
    pub anchor: Anchor,
    pub consume_tap_events: bool,
    pub draggable: bool,
    pub flat: bool,
    pub info_window: InfoWindow,
    pub rotation: f32,
    pub visible: bool,
    pub z_index: f32,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            anchor: Anchor::BOTTOM_CENTER,
            consume_tap_events: false,
            draggable: false,
            flat: false,
            info_window: Default::default(),
            rotation: 0.0,
            visible: true,
            z_index: 0.0,
        }
    }
}

impl MarkerOptions {
    /// overwrites the options that are present in `patch`
    pub fn apply(&mut self, patch: &MarkerPatch) {
        if let Some(alpha) = patch.alpha {
            self.alpha = alpha;
        }
        if let Some(anchor) = patch.anchor {
            self.anchor = anchor;
        }
        if let Some(consume) = patch.consume_tap_events {
            self.consume_tap_events = consume;
        }
        if let Some(draggable) = patch.draggable {
            self.draggable = draggable;
        }
        if let Some(flat) = patch.flat {
            self.flat = flat;
        }
        if let Some(info_window) = patch.info_window.as_ref() {
            self.info_window = info_window.clone();
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(visible) = patch.visible {
            self.visible = visible;
        }
        if let Some(z_index) = patch.z_index {
            self.z_index = z_index;
        }
    }
}

/// count labels arrive either as strings or as plain json numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LabelValue", into = "String")]
pub struct Label(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelValue {
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
}
impl From<LabelValue> for Label {
    fn from(value: LabelValue) -> Self {
        Label(match value {
            LabelValue::Text(s) => s,
            LabelValue::Int(i) => i.to_string(),
            LabelValue::UInt(u) => u.to_string(),
            LabelValue::Float(f) => float_label(f),
        })
    }
}

/// Formats a json float the way the host prints a double: always with a fractional digit,
/// and in `1.0E7` notation outside `[1e-3, 1e7)`.
fn float_label(f: f64) -> String {
    let magnitude = f.abs();
    if !f.is_finite() || magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let plain = f.to_string();
        if f.is_finite() && !plain.contains('.') {
            return format!("{plain}.0");
        }
        return plain;
    }
    let scientific = format!("{f:E}");
    match scientific.split_once('E') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => {
            format!("{mantissa}.0E{exponent}")
        }
        _ => scientific,
    }
}
impl From<Label> for String {
    fn from(value: Label) -> Self {
        value.0
    }
}

/// Every field of a marker as optional. Used directly for `change` requests, where only the
/// present fields are applied, and as the raw form of an `add` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkerPatch {
    pub marker_id: Option<String>,
    pub position: Option<LatLng>,
    pub alpha: Option<f32>,
    pub anchor: Option<Anchor>,
    pub consume_tap_events: Option<bool>,
    pub draggable: Option<bool>,
    pub flat: Option<bool>,
    pub info_window: Option<InfoWindow>,
    pub rotation: Option<f32>,
    pub visible: Option<bool>,
    pub z_index: Option<f32>,
    pub count: Option<Label>,
    pub price: Option<String>,
}

impl MarkerPatch {
    pub fn from_json(value: &Value) -> Result<Self, MarkerError> {
        Ok(Self::deserialize(value)?)
    }

    /// `count` wins over `price` when both are sent
    pub fn badge(&self) -> Option<Badge> {
        if let Some(count) = self.count.as_ref() {
            return Some(Badge::count(count.0.clone()));
        }
        self.price.as_ref().map(|price| Badge::price(price.clone()))
    }
}

/// A marker as the host wants it to be on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDescriptor {
    pub id: String,
    pub position: LatLng,
    /// `None` keeps the map's default pin
    pub badge: Option<Badge>,
    pub options: MarkerOptions,
}

impl MarkerDescriptor {
    pub fn new(id: impl Into<String>, position: LatLng, badge: Option<Badge>) -> Self {
        Self {
            id: id.into(),
            position,
            badge,
            options: Default::default(),
        }
    }

    pub fn with_options(mut self, options: MarkerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn from_json(value: &Value) -> Result<Self, MarkerError> {
        Self::try_from(MarkerPatch::from_json(value)?)
    }
}

impl TryFrom<MarkerPatch> for MarkerDescriptor {
    type Error = MarkerError;

    fn try_from(patch: MarkerPatch) -> Result<Self, Self::Error> {
        let badge = patch.badge();
        let mut options = MarkerOptions::default();
        options.apply(&patch);
        let MarkerPatch {
            marker_id,
            position,
            ..
        } = patch;
        Ok(Self {
            id: marker_id.ok_or(MarkerError::MissingField("markerId"))?,
            position: position.ok_or(MarkerError::MissingField("position"))?,
            badge,
            options,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::*;
    use serde_json::json;
    use similar_asserts::assert_eq;

    #[test]
    fn full_descriptor() {
        let descriptor = MarkerDescriptor::from_json(&json!({
            "markerId": "m1",
            "position": [-23.55, -46.63],
            "price": "R$ 1.2K",
            "alpha": 0.5,
            "anchor": [0.5, 0.5],
            "consumeTapEvents": true,
            "draggable": true,
            "infoWindow": {"title": "Apartment", "snippet": "2 rooms"},
            "zIndex": 3.0
        }))
        .unwrap();
        assert_eq!(descriptor.id, "m1");
        assert_eq!(descriptor.position, LatLng::new(-23.55, -46.63));
        assert_eq!(descriptor.badge, Some(Badge::price("R$ 1.2K")));
        assert_eq!(descriptor.options.alpha, 0.5);
        assert_eq!(descriptor.options.anchor, Anchor { u: 0.5, v: 0.5 });
        assert!(descriptor.options.consume_tap_events);
        assert!(descriptor.options.visible);
        assert_eq!(
            descriptor.options.info_window,
            InfoWindow {
                title: Some("Apartment".to_owned()),
                snippet: Some("2 rooms".to_owned()),
                anchor: Anchor::TOP_CENTER,
            }
        );
    }

    #[rstest]
    #[case(json!("5"), "5")]
    #[case(json!(5), "5")]
    #[case(json!(1.5), "1.5")]
    #[case(json!(5.0), "5.0")]
    #[case(json!(-0.0), "-0.0")]
    #[case(json!(12_500_000.0), "1.25E7")]
    #[case(json!(1e7), "1.0E7")]
    #[case(json!(0.0001), "1.0E-4")]
    #[case(json!(u64::MAX), "18446744073709551615")]
    #[case(json!(-7), "-7")]
    fn count_accepts_strings_and_numbers(#[case] count: Value, #[case] label: &str) {
        let descriptor = MarkerDescriptor::from_json(&json!({
            "markerId": "c",
            "position": [0.0, 0.0],
            "count": count,
        }))
        .unwrap();
        assert_eq!(descriptor.badge, Some(Badge::count(label)));
    }

    #[test]
    fn count_wins_over_price() {
        let patch = MarkerPatch::from_json(&json!({"count": "3", "price": "10"})).unwrap();
        assert_eq!(patch.badge(), Some(Badge::count("3")));
    }

    #[test]
    fn no_badge_keys_means_default_icon() {
        let descriptor =
            MarkerDescriptor::from_json(&json!({"markerId": "x", "position": [1.0, 2.0]})).unwrap();
        assert_eq!(descriptor.badge, None);
        assert_eq!(descriptor.options, MarkerOptions::default());
    }

    #[rstest]
    #[case(json!({"position": [1.0, 2.0]}), "markerId")]
    #[case(json!({"markerId": "x"}), "position")]
    fn missing_required_fields(#[case] value: Value, #[case] field: &str) {
        match MarkerDescriptor::from_json(&value) {
            Err(MarkerError::MissingField(missing)) => assert_eq!(missing, field),
            other => panic!("expected missing field, got {other:?}"),
        }
    }

    #[test]
    fn wrong_types_are_malformed() {
        assert!(matches!(
            MarkerDescriptor::from_json(&json!({"markerId": 7, "position": "here"})),
            Err(MarkerError::MalformedDescriptor(_))
        ));
        assert!(MarkerDescriptor::from_json(&json!("m1")).is_err());
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut options = MarkerOptions {
            draggable: true,
            z_index: 2.0,
            ..Default::default()
        };
        let patch = MarkerPatch::from_json(&json!({"markerId": "m1", "zIndex": 5.0})).unwrap();
        options.apply(&patch);
        assert!(options.draggable);
        assert_eq!(options.z_index, 5.0);
    }

    #[test]
    fn position_is_a_pair_on_the_wire() {
        assert_eq!(
            serde_json::to_value(LatLng::new(1.5, -2.0)).unwrap(),
            json!([1.5, -2.0])
        );
    }
}
