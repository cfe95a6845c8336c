use std::path::Path;

use anyhow::Context;
use deepfield_kernel::WorldConfig;
use deepfield_view::ViewSettings;
use serde::{Deserialize, Serialize};

/// Everything the CLI can be configured with. Missing fields take defaults;
/// a missing `view` section leaves the compressor unconfigured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub view: Option<ViewSettings>,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self {
                view: Some(ViewSettings::default()),
                ..Self::default()
            });
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.world.validate().context("invalid world config")?;
        if let Some(view) = &config.view {
            view.validate().context("invalid view config")?;
        }
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_view() {
        let config = AppConfig::load(None).unwrap();
        assert!(config.view.is_some());
        assert!(config.world.wrap_space);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "world": { "arena": { "spacing": 10.0 } } }"#).unwrap();
        assert_eq!(config.world.arena.spacing, 10.0);
        assert_eq!(config.world.arena.width, 4000.0);
        assert!(config.view.is_none());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/deepfield.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/deepfield.json"));
    }
}
