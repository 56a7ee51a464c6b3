//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/tv/config.toml.

use std::env;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use taskview_core::filter::parse_timezone;

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Keys accepted by `tv config set`.
const VALID_KEYS: &str = "timezone, data_path, output.color, filter.include_nulls";

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# tv - task view CLI configuration

# Config schema version (do not modify)
version = 1

# IANA timezone for dates in filters (can also use TV_TIMEZONE env var)
# timezone = "Europe/Berlin"

# Snapshot file to operate on (can also use TV_DATA env var)
# data_path = "/path/to/snapshot.json"

# Output preferences
[output]
# color = true              # Enable colors (respects NO_COLOR env)

# Filter defaults
[filter]
# include_nulls = false     # Also match tasks whose filtered fields are unset
"#;

/// Configuration file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Timezone for dates in filters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Snapshot file path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Filter settings.
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            timezone: None,
            data_path: None,
            output: OutputConfig::default(),
            filter: FilterConfig::default(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable colors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

/// Filter configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Include tasks whose filtered fields are unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_nulls: Option<bool>,
}

/// Gets the config file path.
///
/// `TV_CONFIG` wins, then `$XDG_CONFIG_HOME/tv/config.toml`, then
/// `~/.config/tv/config.toml` on all platforms.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("TV_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("tv").join("config.toml"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("tv").join("config.toml"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Loads the configuration from disk.
///
/// A missing file yields the default configuration.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    migrate_config(config)
}

/// Migrates config to current version if needed.
fn migrate_config(mut config: Config) -> Result<Config> {
    // Version 1 is the initial schema; later versions migrate here in order.
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Creates the config file's directory.
fn ensure_config_dir(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }
    Ok(())
}

/// Saves the configuration to disk.
fn save_config(config: &Config) -> Result<()> {
    let path = get_config_path()?;
    ensure_config_dir(&path)?;

    let content = toml::to_string_pretty(config)
        .map_err(|e| CommandError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(&path, content)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        if path.exists() {
            println!("Settings:");
            if let Some(ref timezone) = config.timezone {
                println!("  timezone: {}", timezone);
            }
            if let Some(ref data_path) = config.data_path {
                println!("  data_path: {}", data_path.display());
            }

            println!("\n[output]");
            if let Some(color) = config.output.color {
                println!("  color: {}", color);
            }

            println!("\n[filter]");
            if let Some(include_nulls) = config.filter.include_nulls {
                println!("  include_nulls: {}", include_nulls);
            }
        } else {
            println!("(No config file exists. Run 'tv config init' to create one.)");
        }
    }

    Ok(())
}

/// Executes the config init command.
///
/// An existing file is left untouched.
pub fn execute_init(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;
    let created = !path.exists();

    if created {
        ensure_config_dir(&path)?;
        fs::write(&path, DEFAULT_CONFIG)
            .map_err(|e| CommandError::Config(format!("Failed to create config file: {}", e)))?;
    }

    if ctx.json_output {
        let output = serde_json::json!({
            "status": if created { "created" } else { "exists" },
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        if created {
            println!("Created default config at: {}", path.display());
        } else {
            println!("Config already exists at: {}", path.display());
        }
    }

    Ok(())
}

/// Options for the config set command.
pub struct ConfigSetOptions {
    /// Configuration key.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Applies one `key = value` setting to a config.
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let (section, field) = match key.split_once('.') {
        Some((section, field)) => (Some(section), field),
        None => (None, key),
    };

    match (section, field) {
        (None, "timezone") => {
            parse_timezone(value).map_err(|e| CommandError::Config(e.to_string()))?;
            config.timezone = Some(value.to_string());
        }
        (None, "data_path") => {
            config.data_path = Some(PathBuf::from(value));
        }
        (Some("output"), "color") => {
            config.output.color = Some(parse_bool(value)?);
        }
        (Some("filter"), "include_nulls") => {
            config.filter.include_nulls = Some(parse_bool(value)?);
        }
        _ => {
            return Err(CommandError::Config(format!(
                "Unknown config key '{}'. Valid keys: {}",
                key, VALID_KEYS
            )));
        }
    }
    Ok(())
}

/// Executes the config set command.
pub fn execute_set(ctx: &CommandContext, opts: &ConfigSetOptions) -> Result<()> {
    let mut config = load_config()?;
    let path = get_config_path()?;

    apply_setting(&mut config, &opts.key, &opts.value)?;
    save_config(&config)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "key": opts.key,
            "value": opts.value,
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Set {} = {}", opts.key, opts.value);
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Parses a boolean value from string.
fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(CommandError::Config(format!(
            "Invalid boolean value '{}'. Use true/false, yes/no, 1/0, or on/off",
            s
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_values() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("YES").unwrap());
        assert!(parse_bool("on").unwrap());
        assert!(!parse_bool("False").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
        assert!(parse_bool("").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.timezone.is_none());
        assert!(config.data_path.is_none());
        assert!(config.output.color.is_none());
        assert!(config.filter.include_nulls.is_none());
    }

    #[test]
    fn test_default_config_text_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.timezone.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config {
            version: CONFIG_VERSION,
            timezone: Some("Europe/Berlin".to_string()),
            data_path: None,
            output: OutputConfig { color: Some(false) },
            filter: FilterConfig {
                include_nulls: Some(true),
            },
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("version = 1"));
        assert!(toml_str.contains("timezone = \"Europe/Berlin\""));
        assert!(!toml_str.contains("data_path"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("color = false"));
        assert!(toml_str.contains("[filter]"));
        assert!(toml_str.contains("include_nulls = true"));
    }

    #[test]
    fn test_config_deserialization_partial() {
        let toml_str = r#"
[filter]
include_nulls = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.timezone.is_none());
        assert_eq!(config.filter.include_nulls, Some(true));
        assert!(config.output.color.is_none());
    }

    #[test]
    fn test_migrate_config_preserves_data() {
        let config = Config {
            version: 0,
            timezone: Some("UTC".to_string()),
            data_path: Some(PathBuf::from("/tmp/tv.json")),
            output: OutputConfig { color: Some(true) },
            filter: FilterConfig::default(),
        };

        let migrated = migrate_config(config).unwrap();
        assert_eq!(migrated.version, CONFIG_VERSION);
        assert_eq!(migrated.timezone.as_deref(), Some("UTC"));
        assert_eq!(migrated.data_path, Some(PathBuf::from("/tmp/tv.json")));
        assert_eq!(migrated.output.color, Some(true));
    }

    #[test]
    fn test_apply_setting_keys() {
        let mut config = Config::default();
        apply_setting(&mut config, "timezone", "Europe/Berlin").unwrap();
        apply_setting(&mut config, "data_path", "/tmp/a.json").unwrap();
        apply_setting(&mut config, "output.color", "off").unwrap();
        apply_setting(&mut config, "filter.include_nulls", "yes").unwrap();

        assert_eq!(config.timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(config.data_path, Some(PathBuf::from("/tmp/a.json")));
        assert_eq!(config.output.color, Some(false));
        assert_eq!(config.filter.include_nulls, Some(true));
    }

    #[test]
    fn test_apply_setting_rejects_bad_input() {
        let mut config = Config::default();
        let err = apply_setting(&mut config, "timezone", "Mars/Olympus").unwrap_err();
        assert!(matches!(err, CommandError::Config(_)));

        let err = apply_setting(&mut config, "output.width", "80").unwrap_err();
        assert!(err.to_string().contains("Unknown config key 'output.width'"));
        assert!(config.timezone.is_none());
    }
}
