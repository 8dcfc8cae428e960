//! Decoding of the method calls the host sends over its channel.
//!
//! | method                     | arguments                                                   | result |
//! |----------------------------|-------------------------------------------------------------|--------|
//! | `markers#update`           | `{markersToAdd: [..], markersToChange: [..], markerIdsToRemove: [..]}` | null |
//! | `markers#add`              | `[descriptor, ..]`                                          | null   |
//! | `markers#change`           | `[patch, ..]`                                               | null   |
//! | `markers#remove`           | `[markerId, ..]`                                            | null   |
//! | `marker#showInfoWindow`    | `{markerId}`                                                | null   |
//! | `marker#hideInfoWindow`    | `{markerId}`                                                | null   |
//! | `marker#isInfoWindowShown` | `{markerId}`                                                | bool   |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{HostChannel, MapSdk, MarkerDescriptor, MarkerError, MarkerPatch, MarkerRegistry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MethodReply {
    Success { result: Value },
    Error { code: String, message: String },
    NotImplemented,
}

impl MethodReply {
    pub fn success(result: impl Into<Value>) -> Self {
        Self::Success {
            result: result.into(),
        }
    }
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<&MarkerError> for MethodReply {
    fn from(err: &MarkerError) -> Self {
        Self::Error {
            code: err.channel_code().to_owned(),
            message: err.to_string(),
        }
    }
}

impl From<Result<(), MarkerError>> for MethodReply {
    fn from(result: Result<(), MarkerError>) -> Self {
        match result {
            Ok(()) => MethodReply::success(Value::Null),
            Err(err) => MethodReply::from(&err),
        }
    }
}

/// Owns a registry and feeds it the host's method calls.
#[derive(Debug)]
pub struct MethodDispatcher<M: MapSdk, C: HostChannel> {
    registry: MarkerRegistry<M, C>,
}

impl<M: MapSdk, C: HostChannel> MethodDispatcher<M, C> {
    pub fn new(registry: MarkerRegistry<M, C>) -> Self {
        Self { registry }
    }
    pub fn registry(&self) -> &MarkerRegistry<M, C> {
        &self.registry
    }
    pub fn registry_mut(&mut self) -> &mut MarkerRegistry<M, C> {
        &mut self.registry
    }
    pub fn into_registry(self) -> MarkerRegistry<M, C> {
        self.registry
    }

    pub fn handle_method_call(&mut self, call: &MethodCall) -> MethodReply {
        debug!(method = %call.method, "method call");
        let args = &call.arguments;
        let reply = match call.method.as_str() {
            "markers#update" => self.update(args),
            "markers#add" => self.registry.add_all(descriptors(Some(args))).into(),
            "markers#change" => self.registry.update_all(patches(Some(args))).into(),
            "markers#remove" => self.registry.remove_all(marker_ids(Some(args))).into(),
            "marker#showInfoWindow" => self
                .registry
                .show_info_window(marker_id_arg(args))
                .into(),
            "marker#hideInfoWindow" => self
                .registry
                .hide_info_window(marker_id_arg(args))
                .into(),
            "marker#isInfoWindowShown" => {
                match self.registry.is_info_window_shown(marker_id_arg(args)) {
                    Ok(shown) => MethodReply::success(shown),
                    Err(err) => MethodReply::from(&err),
                }
            }
            other => {
                warn!(method = other, "method not implemented");
                MethodReply::NotImplemented
            }
        };
        if let MethodReply::Error { code, message } = &reply {
            warn!(method = %call.method, %code, %message, "method call failed");
        }
        reply
    }

    /// adds, then changes, then removes, the same order the host applies them in
    fn update(&mut self, args: &Value) -> MethodReply {
        let mut first = None;
        for result in [
            self.registry.add_all(descriptors(args.get("markersToAdd"))),
            self.registry
                .update_all(patches(args.get("markersToChange"))),
            self.registry
                .remove_all(marker_ids(args.get("markerIdsToRemove"))),
        ] {
            if let Err(err) = result {
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err).into()
    }
}

fn marker_id_arg(args: &Value) -> &str {
    args.get("markerId").and_then(Value::as_str).unwrap_or_default()
}

fn entries(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(entries)) => entries.as_slice(),
        None | Some(Value::Null) => &[],
        Some(other) => {
            warn!(?other, "expected a list of markers");
            &[]
        }
    }
}

/// null entries are skipped. so are malformed ones, with a warning
fn parse_each<'a, T>(
    value: Option<&'a Value>,
    parse: impl Fn(&Value) -> Result<T, MarkerError> + 'a,
) -> impl Iterator<Item = Option<T>> + 'a {
    entries(value).iter().map(move |entry| {
        if entry.is_null() {
            return None;
        }
        match parse(entry) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!(?err, %entry, "skipping malformed marker");
                None
            }
        }
    })
}

fn descriptors(value: Option<&Value>) -> impl Iterator<Item = Option<MarkerDescriptor>> + '_ {
    parse_each(value, MarkerDescriptor::from_json)
}

/// a change without a `markerId` names no marker, so it is skipped like a malformed add
fn patches(value: Option<&Value>) -> impl Iterator<Item = Option<MarkerPatch>> + '_ {
    parse_each(value, |entry| {
        let patch = MarkerPatch::from_json(entry)?;
        if patch.marker_id.is_none() {
            return Err(MarkerError::MissingField("markerId"));
        }
        Ok(patch)
    })
}

fn marker_ids(value: Option<&Value>) -> impl Iterator<Item = Option<&str>> + '_ {
    entries(value).iter().map(|entry| {
        let id = entry.as_str();
        if id.is_none() && !entry.is_null() {
            warn!(%entry, "skipping marker id that is not a string");
        }
        id
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{HeadlessMap, RecordingChannel, RegistryConfig, UnknownIdPolicy};
    use cozy_icon::{IconConfig, IconRenderer};
    use rstest::*;
    use serde_json::json;
    use similar_asserts::assert_eq;

    type Dispatcher = MethodDispatcher<HeadlessMap, RecordingChannel>;

    fn dispatcher_with(policy: UnknownIdPolicy) -> Dispatcher {
        MethodDispatcher::new(MarkerRegistry::new(
            HeadlessMap::new(),
            RecordingChannel::new(),
            IconRenderer::new(IconConfig::default()).unwrap(),
            RegistryConfig {
                unknown_id_policy: policy,
                ..Default::default()
            },
        ))
    }

    #[fixture]
    fn dispatcher() -> Dispatcher {
        dispatcher_with(UnknownIdPolicy::Lenient)
    }

    fn call(dispatcher: &mut Dispatcher, method: &str, arguments: Value) -> MethodReply {
        dispatcher.handle_method_call(&MethodCall::new(method, arguments))
    }

    #[rstest]
    fn update_adds_changes_and_removes(mut dispatcher: Dispatcher) {
        let reply = call(
            &mut dispatcher,
            "markers#update",
            json!({
                "markersToAdd": [
                    {"markerId": "a", "position": [0.0, 0.0], "count": 3},
                    {"markerId": "b", "position": [1.0, 1.0], "price": "$10"},
                ]
            }),
        );
        assert_eq!(reply, MethodReply::success(Value::Null));
        assert_eq!(dispatcher.registry().len(), 2);

        let reply = call(
            &mut dispatcher,
            "markers#update",
            json!({
                "markersToChange": [{"markerId": "a", "count": 4}],
                "markerIdsToRemove": ["b"]
            }),
        );
        assert!(reply.is_success());
        let registry = dispatcher.registry();
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(
            registry.marker("a").unwrap().badge,
            Some(crate::Badge::count("4"))
        );
    }

    #[rstest]
    fn null_and_malformed_entries_are_skipped(mut dispatcher: Dispatcher) {
        let reply = call(
            &mut dispatcher,
            "markers#add",
            json!([
                null,
                {"position": [0.0, 0.0]},
                {"markerId": "ok", "position": [0.0, 0.0]},
                "garbage"
            ]),
        );
        assert!(reply.is_success());
        assert_eq!(dispatcher.registry().ids().collect::<Vec<_>>(), vec!["ok"]);
    }

    #[rstest]
    #[case(UnknownIdPolicy::Lenient)]
    #[case(UnknownIdPolicy::Strict)]
    fn changes_without_an_id_are_skipped(#[case] policy: UnknownIdPolicy) {
        let mut dispatcher = dispatcher_with(policy);
        call(
            &mut dispatcher,
            "markers#add",
            json!([{"markerId": "a", "position": [0.0, 0.0]}]),
        );
        let reply = call(
            &mut dispatcher,
            "markers#change",
            json!([{"position": [1.0, 1.0]}, {"markerId": "a", "zIndex": 2.0}]),
        );
        assert_eq!(reply, MethodReply::success(Value::Null));
        let reply = call(
            &mut dispatcher,
            "markers#update",
            json!({"markersToChange": [{"count": 9}]}),
        );
        assert_eq!(reply, MethodReply::success(Value::Null));
        let marker = dispatcher.registry().marker("a").unwrap();
        assert_eq!(marker.position, crate::LatLng::new(0.0, 0.0));
        assert_eq!(marker.options.z_index, 2.0);
        assert_eq!(marker.badge, None);
    }

    #[rstest]
    #[case("marker#showInfoWindow", "showInfoWindow")]
    #[case("marker#hideInfoWindow", "hideInfoWindow")]
    #[case("marker#isInfoWindowShown", "isInfoWindowShown")]
    fn info_window_calls_report_invalid_ids(
        mut dispatcher: Dispatcher,
        #[case] method: &str,
        #[case] short: &str,
    ) {
        let reply = call(&mut dispatcher, method, json!({"markerId": "ghost"}));
        assert_eq!(
            reply,
            MethodReply::Error {
                code: "Invalid markerId".into(),
                message: format!("{short} called with invalid markerId"),
            }
        );
    }

    #[rstest]
    fn is_info_window_shown_returns_a_bool(mut dispatcher: Dispatcher) {
        call(
            &mut dispatcher,
            "markers#add",
            json!([{"markerId": "a", "position": [0.0, 0.0], "infoWindow": {"title": "t"}}]),
        );
        call(&mut dispatcher, "marker#showInfoWindow", json!({"markerId": "a"}));
        assert_eq!(
            call(&mut dispatcher, "marker#isInfoWindowShown", json!({"markerId": "a"})),
            MethodReply::success(true)
        );
    }

    #[rstest]
    fn unknown_methods_are_not_implemented(mut dispatcher: Dispatcher) {
        assert_eq!(
            call(&mut dispatcher, "map#animateCamera", Value::Null),
            MethodReply::NotImplemented
        );
    }

    #[test]
    fn strict_mode_reports_unknown_removals() {
        let mut dispatcher = dispatcher_with(UnknownIdPolicy::Strict);
        let reply = call(&mut dispatcher, "markers#remove", json!(["ghost"]));
        assert!(matches!(
            reply,
            MethodReply::Error { ref code, .. } if code == "Unknown markerId"
        ));
    }

    #[test]
    fn replies_have_a_json_form() {
        assert_eq!(
            serde_json::to_value(MethodReply::success(true)).unwrap(),
            json!({"status": "success", "result": true})
        );
        assert_eq!(
            serde_json::to_value(MethodReply::NotImplemented).unwrap(),
            json!({"status": "notImplemented"})
        );
    }
}
