use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplarConfig {
    /// Directory holding `<name>.<extension>` views.
    #[serde(default = "default_view_path")]
    pub view_path: PathBuf,
    /// Directory for compiled artifacts. Created on first store.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
    #[serde(default = "default_components_path")]
    pub components_path: PathBuf,
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Per-loop iteration cap, 0 = unlimited.
    #[serde(default)]
    pub max_loop_iterations: usize,
}

fn default_view_path() -> PathBuf {
    PathBuf::from("./views")
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./cache")
}

fn default_components_path() -> PathBuf {
    PathBuf::from("./views/components")
}

fn default_extension() -> String {
    "tpl".to_string()
}

impl Default for TemplarConfig {
    fn default() -> Self {
        TemplarConfig {
            view_path: default_view_path(),
            cache_path: default_cache_path(),
            components_path: default_components_path(),
            extension: default_extension(),
            max_loop_iterations: 0,
        }
    }
}

impl TemplarConfig {
    /// Config rooted at `base`: `base/views`, `base/cache`, `base/views/components`.
    pub fn rooted_at(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        TemplarConfig {
            view_path: base.join("views"),
            cache_path: base.join("cache"),
            components_path: base.join("views").join("components"),
            ..Default::default()
        }
    }
}
