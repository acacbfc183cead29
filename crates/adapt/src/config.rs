// crates/adapt/src/config.rs

use std::fs;
use std::path::Path;

use domain::setting::Settings;
use tracing::debug;

use crate::Error;

/// Load settings from an optional TOML file.
///
/// No path yields the defaults; a path that does not exist is an error.
/// Keys left out of the file keep their defaults.
#[tracing::instrument(skip_all, fields(path = ?path))]
pub fn load_settings(path: Option<&Path>) -> Result<Settings, Error> {
    let Some(path) = path else {
        debug!("no settings file; using defaults");
        return Ok(Settings::default());
    };

    if !path.exists() {
        return Err(Error::Config(format!(
            "settings file not found at {}",
            path.display()
        )));
    }

    let text = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    let settings: Settings = toml::from_str(&text)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;

    for (name, value) in [
        ("source.buffer", settings.source.buffer),
        ("source.error_buffer", settings.source.error_buffer),
        ("stream.buffer", settings.stream.buffer),
        ("stream.error_buffer", settings.stream.error_buffer),
    ] {
        if value == 0 {
            return Err(Error::Config(format!("{name} must be at least 1")));
        }
    }

    debug!(?settings, "settings loaded");
    Ok(settings)
}
