use cozy_icon::{IconConfig, IconRenderer};
use cozy_markers::{
    BadgeKind, HeadlessMap, LatLng, MapSdk, MarkerDescriptor, MarkerIcon, MarkerRegistry,
    MethodCall, MethodDispatcher, MethodReply, NativeEvent, NativeMarkerId, OutboundEvent,
    RecordingChannel, RegistryConfig, UnknownIdPolicy,
};
use rstest::*;
use serde_json::{json, Value};
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

fn bitmap(dispatcher: &Dispatcher, id: &str) -> std::sync::Arc<cozy_icon::RenderedIcon> {
    let registry = dispatcher.registry();
    let native = registry.native_id(id).unwrap();
    match &registry.map().marker(native).unwrap().icon {
        MarkerIcon::Bitmap(icon) => icon.clone(),
        MarkerIcon::Default => panic!("{id} has the default pin"),
    }
}

#[rstest]
fn count_badge_scenario(mut dispatcher: Dispatcher) {
    let reply = call(
        &mut dispatcher,
        "markers#update",
        json!({"markersToAdd": [
            {"markerId": "m1", "position": [-23.5, -46.6], "count": "5"},
            {"markerId": "m2", "position": [-23.6, -46.7], "count": "50"},
        ]}),
    );
    assert!(reply.is_success());
    let registry = dispatcher.registry();
    let handle = registry.handle("m1").unwrap();
    assert_eq!(registry.app_id(&handle.native_id), Some("m1"));
    assert_eq!(registry.map().len(), 2);

    let five = bitmap(&dispatcher, "m1");
    let fifty = bitmap(&dispatcher, "m2");
    assert_eq!(five.height(), fifty.height());
    assert!(five.rgba() != fifty.rgba());
    let fresh = registry
        .icons()
        .renderer()
        .render(BadgeKind::Count, "5")
        .unwrap();
    assert!(*five == fresh);
}

#[rstest]
fn price_bubbles_grow_with_the_label(mut dispatcher: Dispatcher) {
    call(
        &mut dispatcher,
        "markers#add",
        json!([
            {"markerId": "cheap", "position": [0.0, 0.0], "price": "$9"},
            {"markerId": "dear", "position": [0.0, 0.0], "price": "$1,250,000"},
        ]),
    );
    let cheap = bitmap(&dispatcher, "cheap");
    let dear = bitmap(&dispatcher, "dear");
    assert!(dear.width() > cheap.width());
    assert_eq!(dear.height(), cheap.height());
}

#[rstest]
fn add_then_remove_clears_both_directions(mut dispatcher: Dispatcher) {
    call(
        &mut dispatcher,
        "markers#add",
        json!([{"markerId": "a", "position": [0.0, 0.0], "count": 1}]),
    );
    let native = dispatcher.registry().native_id("a").unwrap().clone();
    call(&mut dispatcher, "markers#remove", json!(["a"]));
    let registry = dispatcher.registry();
    assert!(!registry.contains("a"));
    assert_eq!(registry.app_id(&native), None);
    assert!(registry.map().is_empty());
    assert!(registry.is_consistent());
}

#[rstest]
fn removing_an_unknown_id_changes_nothing(mut dispatcher: Dispatcher) {
    call(
        &mut dispatcher,
        "markers#add",
        json!([{"markerId": "a", "position": [0.0, 0.0]}]),
    );
    let reply = call(&mut dispatcher, "markers#remove", json!(["ghost"]));
    assert!(reply.is_success());
    let registry = dispatcher.registry();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.map().len(), 1);
}

#[rstest]
fn double_add_stays_bijective(mut dispatcher: Dispatcher) {
    for price in ["$1", "$2"] {
        call(
            &mut dispatcher,
            "markers#add",
            json!([{"markerId": "a", "position": [0.0, 0.0], "price": price}]),
        );
    }
    let registry = dispatcher.registry();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.map().len(), 1);
    assert!(registry.is_consistent());
    assert_eq!(registry.app_id(&NativeMarkerId::from("m0")), None);
    assert_eq!(registry.app_id(&NativeMarkerId::from("m1")), Some("a"));
}

#[rstest]
fn unknown_update_fires_nothing(mut dispatcher: Dispatcher) {
    let reply = call(
        &mut dispatcher,
        "markers#change",
        json!([{"markerId": "ghost", "position": [1.0, 1.0], "count": 3}]),
    );
    assert!(reply.is_success());
    let registry = dispatcher.registry();
    assert!(registry.is_empty());
    assert!(registry.map().is_empty());
    assert!(registry.channel().events.is_empty());
    assert_eq!(registry.icons().stats(), (0, 0));
}

#[rstest]
fn tap_on_unknown_native_id_is_dropped(mut dispatcher: Dispatcher) {
    let consumed = dispatcher
        .registry_mut()
        .handle_native_event(&NativeEvent::MarkerTap {
            native_id: NativeMarkerId::from("m42"),
        });
    assert!(!consumed);
    assert!(dispatcher.registry().channel().events.is_empty());
}

#[rstest]
fn events_lost_to_a_removal_are_dropped(mut dispatcher: Dispatcher) {
    call(
        &mut dispatcher,
        "markers#add",
        json!([{"markerId": "a", "position": [0.0, 0.0], "draggable": true}]),
    );
    let native = dispatcher.registry().native_id("a").unwrap().clone();
    let registry = dispatcher.registry_mut();
    registry.on_drag_start(&native, LatLng::new(0.0, 0.0));
    registry.remove("a").unwrap();
    registry.on_drag_end(&native, LatLng::new(1.0, 1.0));
    assert_eq!(
        registry.channel_mut().take(),
        vec![OutboundEvent::MarkerDragStart {
            marker_id: "a".into(),
            position: LatLng::new(0.0, 0.0),
        }]
    );
}

#[test]
fn strict_registry_reports_unknown_ids() {
    let mut dispatcher = dispatcher_with(UnknownIdPolicy::Strict);
    let reply = call(
        &mut dispatcher,
        "markers#change",
        json!([{"markerId": "ghost", "zIndex": 1.0}]),
    );
    match reply {
        MethodReply::Error { code, message } => {
            assert_eq!(code, "Unknown markerId");
            assert!(message.contains("ghost"));
        }
        other => panic!("expected an error, got {other:?}"),
    }
    // callbacks are still dropped quietly
    assert!(!dispatcher
        .registry_mut()
        .on_tap(&NativeMarkerId::from("m0")));
}

#[rstest]
fn info_window_follows_the_map(mut dispatcher: Dispatcher) {
    call(
        &mut dispatcher,
        "markers#add",
        json!([
            {"markerId": "a", "position": [0.0, 0.0], "infoWindow": {"title": "A"}},
            {"markerId": "b", "position": [0.0, 0.0], "infoWindow": {"title": "B"}},
        ]),
    );
    call(&mut dispatcher, "marker#showInfoWindow", json!({"markerId": "a"}));
    call(&mut dispatcher, "marker#showInfoWindow", json!({"markerId": "b"}));
    assert_eq!(
        call(&mut dispatcher, "marker#isInfoWindowShown", json!({"markerId": "a"})),
        MethodReply::success(false)
    );
    let native = dispatcher.registry().native_id("b").unwrap().clone();
    assert!(dispatcher.registry().map().is_info_window_shown(&native));
    dispatcher.registry_mut().on_info_window_tap(&native);
    assert_eq!(
        dispatcher.registry().channel().events,
        vec![OutboundEvent::InfoWindowTap {
            marker_id: "b".into()
        }]
    );
}

#[rstest]
fn descriptors_can_be_built_in_code(mut dispatcher: Dispatcher) {
    let registry = dispatcher.registry_mut();
    registry
        .add(MarkerDescriptor::new(
            "typed",
            LatLng::new(1.0, 1.0),
            Some(cozy_markers::Badge::count("12")),
        ))
        .unwrap();
    assert_eq!(registry.icons().len(), 1);
}
