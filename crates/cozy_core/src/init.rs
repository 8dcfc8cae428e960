use crate::prelude::*;
use cap_std::{ambient_authority, fs::Dir};
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "COZY_MARKERS_DATA_DIR";

/// Cozy Markers data directory.
/// If `explicit` is given we use it, otherwise we read a path from env `COZY_MARKERS_DATA_DIR`,
/// otherwise we fall back to data_local_dir/cozy_markers, where data_local_dir is platform specific.
/// Inside this directory we keep the config files and the log file.
pub fn get_data_dir(explicit: Option<&Path>) -> Result<Dir> {
    let authority = ambient_authority();
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => std::env::var(DATA_DIR_ENV).ok().map(PathBuf::from),
    };
    let dir = if let Some(path) = path {
        Dir::create_ambient_dir_all(&path, authority)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to create data directory at {path:?}"))?;
        Dir::open_ambient_dir(&path, authority)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to open data directory at {path:?}"))?
    } else {
        cap_directories::ProjectDirs::from("com.cozy", "", "cozy_markers", authority)
            .ok_or(miette::miette!("getting project dirs failed for some reason"))?
            .data_local_dir()
            .into_diagnostic()
            .wrap_err("failed to get data local dir using capstd")?
    };
    Ok(dir)
}

/// Reads `name` from `dir` as json. If the file does not exist yet, the default value is
/// written to it first so that users have something to edit.
pub fn load_or_create_config<T>(dir: &Dir, name: &str) -> Result<T>
where
    T: Default + Serialize + serde::de::DeserializeOwned,
{
    if !dir.exists(name) {
        let config = T::default();
        dir.write(
            name,
            serde_json::to_string_pretty(&config)
                .into_diagnostic()
                .wrap_err("failed to serialize default config")?
                .as_bytes(),
        )
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to write default config {name}"))?;
        info!(name, "wrote default config");
        return Ok(config);
    }
    let json = dir
        .read_to_string(name)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read config {name}"))?;
    serde_json::from_str(&json)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to deserialize config {name}"))
}

#[cfg(test)]
mod test {
    use super::*;
    use similar_asserts::assert_eq;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        size: u32,
        name: String,
    }
    impl Default for Sample {
        fn default() -> Self {
            Self {
                size: 150,
                name: "cozy".to_owned(),
            }
        }
    }

    fn temp_dir(name: &str) -> Dir {
        let path = std::env::temp_dir().join(format!("cozy_core_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&path);
        get_data_dir(Some(&path)).expect("failed to create temp data dir")
    }

    #[test]
    fn missing_config_is_created_with_defaults() {
        let dir = temp_dir("missing");
        let sample: Sample = load_or_create_config(&dir, "sample.json").unwrap();
        assert_eq!(sample, Sample::default());
        assert!(dir.exists("sample.json"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = temp_dir("partial");
        dir.write("sample.json", br#"{"size": 96}"#).unwrap();
        let sample: Sample = load_or_create_config(&dir, "sample.json").unwrap();
        assert_eq!(
            sample,
            Sample {
                size: 96,
                ..Default::default()
            }
        );
    }

    #[test]
    fn broken_config_is_an_error() {
        let dir = temp_dir("broken");
        dir.write("sample.json", b"{ size: ").unwrap();
        assert!(load_or_create_config::<Sample>(&dir, "sample.json").is_err());
    }
}
