use crate::config::{EditorConfigOverrides, DEFAULT_CONFIG_PATH};
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    config: Option<PathBuf>,
    root: Option<PathBuf>,
    grid_spacing: Option<f32>,
    gravity_ranges: Option<bool>,
    positional: Vec<String>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_arg) = iter.next() {
            let arg = raw_arg.as_ref();
            let Some(key) = arg.strip_prefix("--") else {
                overrides.positional.push(arg.to_string());
                continue;
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{arg}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config = Some(PathBuf::from(value)),
                "root" => overrides.root = Some(PathBuf::from(value)),
                "grid" => {
                    let spacing =
                        value.parse::<f32>().with_context(|| format!("Invalid grid spacing '{value}'"))?;
                    if !spacing.is_finite() || spacing <= 0.0 {
                        bail!("Grid spacing must be positive, got {spacing}");
                    }
                    overrides.grid_spacing = Some(spacing);
                }
                "gravity-ranges" => {
                    overrides.gravity_ranges = Some(parse_bool_flag("gravity-ranges", &value)?);
                }
                _ => bail!("Unknown flag '{arg}'. Supported flags: --config, --root, --grid, --gravity-ranges."),
            }
        }
        Ok(overrides)
    }

    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Arguments that were not flags, in order.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    pub fn into_config_overrides(self) -> EditorConfigOverrides {
        EditorConfigOverrides {
            root: self.root,
            grid_spacing: self.grid_spacing,
            show_gravity_ranges: self.gravity_ranges,
        }
    }
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_positionals() {
        let args = ["level_tool", "validate", "--root", "/srv/game/assets", "lv1.json", "--gravity-ranges", "off"];
        let cli = CliOverrides::parse(args).expect("parse");
        assert_eq!(cli.positional(), ["validate", "lv1.json"]);
        assert_eq!(cli.config_path(), PathBuf::from(DEFAULT_CONFIG_PATH));
        let overrides = cli.into_config_overrides();
        assert_eq!(overrides.root, Some(PathBuf::from("/srv/game/assets")));
        assert_eq!(overrides.show_gravity_ranges, Some(false));
        assert_eq!(overrides.grid_spacing, None);
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["app", "--grid", "50", "--grid", "25", "--config", "a.json", "--config", "b.json"];
        let cli = CliOverrides::parse(args).expect("parse");
        assert_eq!(cli.config_path(), PathBuf::from("b.json"));
        assert_eq!(cli.into_config_overrides().grid_spacing, Some(25.0));
    }

    #[test]
    fn missing_value_errors() {
        let err = CliOverrides::parse(["app", "--root"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_bad_values_and_unknown_flags() {
        let err = CliOverrides::parse(["app", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"));
        let err = CliOverrides::parse(["app", "--grid", "0"]).unwrap_err();
        assert!(err.to_string().contains("must be positive"));
        let err = CliOverrides::parse(["app", "--gravity-ranges", "maybe"]).unwrap_err();
        assert!(err.to_string().contains("Invalid gravity-ranges value"));
    }
}
