use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/editor.json";

#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    /// Explicit asset root; skips repository discovery when set.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "AssetConfig::default_repo_marker")]
    pub repo_marker: String,
    #[serde(default = "AssetConfig::default_asset_dir")]
    pub asset_dir: String,
    #[serde(default = "AssetConfig::default_asset_table")]
    pub asset_table: String,
    #[serde(default = "AssetConfig::default_levels_dir")]
    pub levels_dir: String,
    #[serde(default = "AssetConfig::default_textures_dir")]
    pub textures_dir: String,
    #[serde(default = "AssetConfig::default_gravity_range_texture")]
    pub gravity_range_texture: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "CanvasConfig::default_grid_spacing")]
    pub grid_spacing: f32,
    #[serde(default = "CanvasConfig::default_show_gravity_ranges")]
    pub show_gravity_ranges: bool,
}

/// Initial properties of objects created from the editor.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectDefaults {
    #[serde(default = "ObjectDefaults::default_scale")]
    pub scale: f32,
    #[serde(default = "ObjectDefaults::default_anchor")]
    pub anchor: [f32; 2],
    #[serde(default = "ObjectDefaults::default_planet_cols")]
    pub planet_cols: u32,
    #[serde(default = "ObjectDefaults::default_planet_span")]
    pub planet_span: u32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EditorConfig {
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub defaults: ObjectDefaults,
}

#[derive(Debug, Clone, Default)]
pub struct EditorConfigOverrides {
    pub root: Option<PathBuf>,
    pub grid_spacing: Option<f32>,
    pub show_gravity_ranges: Option<bool>,
}

impl AssetConfig {
    fn default_repo_marker() -> String {
        ".git".to_string()
    }

    fn default_asset_dir() -> String {
        "assets".to_string()
    }

    fn default_asset_table() -> String {
        "json/assets.json".to_string()
    }

    fn default_levels_dir() -> String {
        "json".to_string()
    }

    fn default_textures_dir() -> String {
        "textures".to_string()
    }

    fn default_gravity_range_texture() -> String {
        "textures/range.png".to_string()
    }

    pub fn asset_table_path(&self, asset_root: &Path) -> PathBuf {
        asset_root.join(&self.asset_table)
    }

    pub fn levels_path(&self, asset_root: &Path) -> PathBuf {
        asset_root.join(&self.levels_dir)
    }

    pub fn textures_path(&self, asset_root: &Path) -> PathBuf {
        asset_root.join(&self.textures_dir)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: None,
            repo_marker: Self::default_repo_marker(),
            asset_dir: Self::default_asset_dir(),
            asset_table: Self::default_asset_table(),
            levels_dir: Self::default_levels_dir(),
            textures_dir: Self::default_textures_dir(),
            gravity_range_texture: Self::default_gravity_range_texture(),
        }
    }
}

impl CanvasConfig {
    const fn default_grid_spacing() -> f32 {
        100.0
    }

    const fn default_show_gravity_ranges() -> bool {
        true
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            grid_spacing: Self::default_grid_spacing(),
            show_gravity_ranges: Self::default_show_gravity_ranges(),
        }
    }
}

impl ObjectDefaults {
    const fn default_scale() -> f32 {
        0.5
    }

    const fn default_anchor() -> [f32; 2] {
        [0.5, 0.5]
    }

    const fn default_planet_cols() -> u32 {
        2
    }

    const fn default_planet_span() -> u32 {
        2
    }
}

impl Default for ObjectDefaults {
    fn default() -> Self {
        Self {
            scale: Self::default_scale(),
            anchor: Self::default_anchor(),
            planet_cols: Self::default_planet_cols(),
            planet_span: Self::default_planet_span(),
        }
    }
}

impl EditorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        cfg.canvas.validate().with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("[config] {} not found, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("[config] {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &EditorConfigOverrides) {
        if let Some(root) = overrides.root.as_ref() {
            self.assets.root = Some(root.clone());
        }
        if let Some(spacing) = overrides.grid_spacing {
            if valid_grid_spacing(spacing) {
                self.canvas.grid_spacing = spacing;
            } else {
                log::warn!("[config] ignoring grid spacing override {spacing}");
            }
        }
        if let Some(show) = overrides.show_gravity_ranges {
            self.canvas.show_gravity_ranges = show;
        }
    }
}

impl CanvasConfig {
    pub fn validate(&self) -> Result<()> {
        if !valid_grid_spacing(self.grid_spacing) {
            bail!("canvas.grid_spacing must be a positive number, got {}", self.grid_spacing);
        }
        Ok(())
    }
}

fn valid_grid_spacing(spacing: f32) -> bool {
    spacing.is_finite() && spacing > 0.0
}

impl EditorConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.grid_spacing.is_none() && self.show_gravity_ranges.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.root.is_some() {
            fields.push("root");
        }
        if self.grid_spacing.is_some() {
            fields.push("grid_spacing");
        }
        if self.show_gravity_ranges.is_some() {
            fields.push("gravity_ranges");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: EditorConfig =
            serde_json::from_str(r#"{ "assets": { "asset_table": "data/assets.json" } }"#).expect("parse");
        assert_eq!(cfg.assets.asset_table, "data/assets.json");
        assert_eq!(cfg.assets.repo_marker, ".git");
        assert_eq!(cfg.canvas.grid_spacing, 100.0);
        assert_eq!(cfg.defaults.planet_cols, 2);
        assert_eq!(cfg.defaults.anchor, [0.5, 0.5]);
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let file = NamedTempFile::new().expect("temp file");
        fs::write(file.path(), "{ not json").expect("write");
        let cfg = EditorConfig::load_or_default(file.path());
        assert_eq!(cfg.assets.asset_dir, "assets");
        assert!(EditorConfig::load(file.path()).is_err());
    }

    #[test]
    fn overrides_replace_selected_fields() {
        let mut cfg = EditorConfig::default();
        let overrides = EditorConfigOverrides {
            root: Some(PathBuf::from("/srv/game/assets")),
            grid_spacing: None,
            show_gravity_ranges: Some(false),
        };
        cfg.apply_overrides(&overrides);
        assert_eq!(cfg.assets.root.as_deref(), Some(Path::new("/srv/game/assets")));
        assert_eq!(cfg.canvas.grid_spacing, 100.0);
        assert!(!cfg.canvas.show_gravity_ranges);
        assert_eq!(overrides.applied_fields(), vec!["root", "gravity_ranges"]);
    }

    #[test]
    fn non_positive_grid_spacing_is_rejected() {
        let file = NamedTempFile::new().expect("temp file");
        for spacing in ["0", "-25", "1e-60"] {
            fs::write(file.path(), format!(r#"{{ "canvas": {{ "grid_spacing": {spacing} }} }}"#)).expect("write");
            let err = EditorConfig::load(file.path()).expect_err("grid spacing must be rejected");
            assert!(format!("{err:#}").contains("grid_spacing"), "{err:#}");
            assert_eq!(EditorConfig::load_or_default(file.path()).canvas.grid_spacing, 100.0);
        }

        let mut cfg = EditorConfig::default();
        cfg.apply_overrides(&EditorConfigOverrides { grid_spacing: Some(f32::NAN), ..Default::default() });
        assert_eq!(cfg.canvas.grid_spacing, 100.0);
    }
}
