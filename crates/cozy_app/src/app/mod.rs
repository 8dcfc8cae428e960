use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use cap_std::{ambient_authority, fs::Dir};
use clap::Parser;
use cozy_core::init::{get_data_dir, load_or_create_config};
use cozy_core::prelude::*;
use cozy_core::trace::{install_miette_panic_hooks, CozyTracingLayer};
use cozy_icon::{IconConfig, IconRenderer};
use cozy_markers::{
    HeadlessMap, MarkerIcon, MarkerRegistry, MethodCall, MethodDispatcher, NativeEvent,
    RegistryConfig,
};
use serde_json::json;

mod channel;
use channel::JsonLinesChannel;

pub const ICON_CONFIG_NAME: &str = "icon_config.json";
pub const REGISTRY_CONFIG_NAME: &str = "registry_config.json";

/// Drives a marker registry over an in-memory map from json lines.
///
/// Every input line is either a host method call `{"method": "markers#update", "arguments": {...}}`
/// or a native map callback `{"event": "markerTap", "nativeId": "m0"}`.
/// Replies and events for the host are written to stdout, one json object per line.
#[derive(Debug, Parser)]
#[command(name = "cozy_markers", version)]
struct CozyArgs {
    /// data directory with the config files and the log file.
    /// defaults to $COZY_MARKERS_DATA_DIR, then to the platform's local data directory
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// read from this file instead of stdin
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,
    /// on exit, write the badge of every marker left on the map into this directory as png
    #[arg(long, value_name = "DIR")]
    dump_icons: Option<PathBuf>,
}

type Dispatcher<W> = MethodDispatcher<HeadlessMap, JsonLinesChannel<W>>;

#[derive(Deserialize)]
#[serde(untagged)]
enum InputLine {
    Event(NativeEvent),
    Call(MethodCall),
}

#[derive(Debug, Default, PartialEq)]
struct SessionStats {
    calls: usize,
    events: usize,
    skipped: usize,
}

pub fn start_cozy_markers() -> Result<()> {
    let args = CozyArgs::parse();
    let data_dir =
        get_data_dir(args.data_dir.as_deref()).wrap_err("failed to open the data directory")?;
    let log_file_flush_guard = CozyTracingLayer::install_tracing(&data_dir)?;
    install_miette_panic_hooks()?;

    let result = run(&args, &data_dir);
    if let Err(e) = &result {
        error!(?e, "cozy markers stopped");
    }
    let recent = CozyTracingLayer::recent_events();
    if !recent.is_empty() {
        eprintln!("{} warnings/errors this session:", recent.len());
        for event in recent {
            eprintln!("  {event}");
        }
    }
    std::mem::drop(log_file_flush_guard);
    result
}

fn run(args: &CozyArgs, data_dir: &Dir) -> Result<()> {
    let icon_config: IconConfig = load_or_create_config(data_dir, ICON_CONFIG_NAME)?;
    let registry_config: RegistryConfig = load_or_create_config(data_dir, REGISTRY_CONFIG_NAME)?;
    let renderer = IconRenderer::new(icon_config).wrap_err("failed to create icon renderer")?;
    let mut dispatcher = MethodDispatcher::new(MarkerRegistry::new(
        HeadlessMap::new(),
        JsonLinesChannel::new(std::io::stdout()),
        renderer,
        registry_config,
    ));

    let stats = match args.input.as_ref() {
        Some(path) => {
            let file = cap_std::fs::File::open_ambient(path, ambient_authority())
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to open input {path:?}"))?;
            run_session(BufReader::new(file), &mut dispatcher)?
        }
        None => run_session(std::io::stdin().lock(), &mut dispatcher)?,
    };
    let registry = dispatcher.registry();
    info!(
        ?stats,
        markers = registry.len(),
        cache = ?registry.icons().stats(),
        "session finished"
    );

    if let Some(path) = args.dump_icons.as_ref() {
        Dir::create_ambient_dir_all(path, ambient_authority())
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to create icon dump directory {path:?}"))?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to open icon dump directory {path:?}"))?;
        let written = dump_icons(&dispatcher, &dir)?;
        info!(written, ?path, "dumped icons");
    }
    Ok(())
}

fn run_session<R: BufRead, W: Write>(
    input: R,
    dispatcher: &mut Dispatcher<W>,
) -> Result<SessionStats> {
    let mut stats = SessionStats::default();
    for (index, line) in input.lines().enumerate() {
        let line = line.into_diagnostic().wrap_err("failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<InputLine>(line) {
            Ok(InputLine::Call(call)) => {
                stats.calls += 1;
                let reply = dispatcher.handle_method_call(&call);
                dispatcher
                    .registry_mut()
                    .channel_mut()
                    .reply(&call.method, &reply);
            }
            Ok(InputLine::Event(event)) => {
                stats.events += 1;
                let registry = dispatcher.registry_mut();
                let result = registry.handle_native_event(&event);
                registry
                    .channel_mut()
                    .write_line(&json!({ "event": event, "result": result }));
            }
            Err(e) => {
                stats.skipped += 1;
                warn!(line = index + 1, %e, "skipping input that is neither a method call nor a map event");
            }
        }
    }
    Ok(stats)
}

/// Writes `<markerId>.png` for every marker that has a badge. Returns the number of files written.
fn dump_icons<W: Write>(dispatcher: &Dispatcher<W>, dir: &Dir) -> Result<usize> {
    let registry = dispatcher.registry();
    let mut written = 0;
    for (native_id, marker) in registry.map().markers() {
        let MarkerIcon::Bitmap(icon) = &marker.icon else {
            continue;
        };
        let Some(app_id) = registry.app_id(native_id) else {
            continue;
        };
        let name = icon_file_name(app_id);
        let png = icon
            .to_png()
            .wrap_err_with(|| format!("failed to encode icon of {app_id}"))?;
        dir.write(&name, png)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to write {name}"))?;
        debug!(app_id, %name, "dumped icon");
        written += 1;
    }
    Ok(written)
}

fn icon_file_name(app_id: &str) -> String {
    let stem: String = app_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.png")
}

#[cfg(test)]
mod test {
    use super::*;
    use similar_asserts::assert_eq;

    fn dispatcher() -> Dispatcher<Vec<u8>> {
        MethodDispatcher::new(MarkerRegistry::new(
            HeadlessMap::new(),
            JsonLinesChannel::new(vec![]),
            IconRenderer::new(IconConfig::default()).unwrap(),
            RegistryConfig::default(),
        ))
    }

    fn output(dispatcher: Dispatcher<Vec<u8>>) -> Vec<Value> {
        let (_, channel) = dispatcher.into_registry().into_parts();
        let out = channel.into_inner();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn session_replies_and_forwards_events() {
        let input = r#"
{"method": "markers#update", "arguments": {"markersToAdd": [{"markerId": "home", "position": [1.0, 2.0], "count": "5"}]}}
{"event": "markerTap", "nativeId": "m0"}
{"event": "markerTap", "nativeId": "m7"}
not json
{"method": "map#moveCamera"}
"#;
        let mut dispatcher = dispatcher();
        let stats = run_session(input.as_bytes(), &mut dispatcher).unwrap();
        assert_eq!(
            stats,
            SessionStats {
                calls: 2,
                events: 2,
                skipped: 1
            }
        );
        assert_eq!(
            output(dispatcher),
            vec![
                json!({"method": "markers#update", "reply": {"status": "success", "result": null}}),
                json!({"invoke": "marker#onTap", "arguments": {"markerId": "home"}}),
                json!({"event": {"event": "markerTap", "nativeId": "m0"}, "result": false}),
                json!({"event": {"event": "markerTap", "nativeId": "m7"}, "result": false}),
                json!({"method": "map#moveCamera", "reply": {"status": "notImplemented"}}),
            ]
        );
    }

    #[test]
    fn file_names_are_safe() {
        assert_eq!(icon_file_name("m1"), "m1.png");
        assert_eq!(icon_file_name("../a b"), "___a_b.png");
    }

    #[test]
    fn dump_writes_one_png_per_badge() {
        let path = std::env::temp_dir().join(format!("cozy_app_dump_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&path);
        Dir::create_ambient_dir_all(&path, ambient_authority()).unwrap();
        let dir = Dir::open_ambient_dir(&path, ambient_authority()).unwrap();

        let mut dispatcher = dispatcher();
        let input = r#"{"method": "markers#add", "arguments": [{"markerId": "a", "position": [0.0, 0.0], "price": "$5"}, {"markerId": "b", "position": [0.0, 0.0]}]}"#;
        run_session(input.as_bytes(), &mut dispatcher).unwrap();
        assert_eq!(dump_icons(&dispatcher, &dir).unwrap(), 1);
        assert!(dir.exists("a.png"));
        assert!(!dir.exists("b.png"));
    }
}
