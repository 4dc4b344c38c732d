//! Scan configuration: defaults, config files and command-line overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IoResultExt, ScanError, ScanResult};

/// Config files searched in each directory, in priority order.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "unused-members.toml",
    ".unused-class-membersrc.json",
    ".unused-class-membersrc",
];

/// `package.json` key holding an inline configuration.
pub const PACKAGE_JSON_KEY: &str = "ts-unused-class-members";

/// Effective configuration of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    /// Path to the `tsconfig.json`.
    pub project: PathBuf,
    /// Restrict analysis to a directory or single file.
    pub path: Option<String>,
    pub fix: bool,
    /// Files whose path matches are not analyzed.
    pub ignore_file_regex: Option<String>,
    pub ignore_could_be_private: bool,
    pub ignore_member_names: Vec<String>,
    pub ignore_decorator_names: Vec<String>,
    pub ignore_initializer_names: Vec<String>,
    pub skip_private: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            project: PathBuf::from("tsconfig.json"),
            path: None,
            fix: false,
            ignore_file_regex: None,
            ignore_could_be_private: false,
            ignore_member_names: Vec::new(),
            ignore_decorator_names: Vec::new(),
            ignore_initializer_names: Vec::new(),
            skip_private: false,
        }
    }
}

/// A configuration layer where every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialConfig {
    pub project: Option<PathBuf>,
    pub path: Option<String>,
    pub fix: Option<bool>,
    pub ignore_file_regex: Option<String>,
    pub ignore_could_be_private: Option<bool>,
    pub ignore_member_names: Option<Vec<String>>,
    pub ignore_decorator_names: Option<Vec<String>>,
    pub ignore_initializer_names: Option<Vec<String>>,
    pub skip_private: Option<bool>,
}

impl PartialConfig {
    /// Fields set in `self` win over `other`.
    pub fn or(self, other: PartialConfig) -> PartialConfig {
        PartialConfig {
            project: self.project.or(other.project),
            path: self.path.or(other.path),
            fix: self.fix.or(other.fix),
            ignore_file_regex: self.ignore_file_regex.or(other.ignore_file_regex),
            ignore_could_be_private: self
                .ignore_could_be_private
                .or(other.ignore_could_be_private),
            ignore_member_names: self.ignore_member_names.or(other.ignore_member_names),
            ignore_decorator_names: self.ignore_decorator_names.or(other.ignore_decorator_names),
            ignore_initializer_names: self
                .ignore_initializer_names
                .or(other.ignore_initializer_names),
            skip_private: self.skip_private.or(other.skip_private),
        }
    }
}

impl ScanConfig {
    /// Command line over config file over defaults.
    pub fn merge(file: Option<PartialConfig>, cli: PartialConfig) -> Self {
        let merged = cli.or(file.unwrap_or_default());
        let defaults = Self::default();
        Self {
            project: merged.project.unwrap_or(defaults.project),
            path: merged.path,
            fix: merged.fix.unwrap_or(defaults.fix),
            ignore_file_regex: merged.ignore_file_regex,
            ignore_could_be_private: merged
                .ignore_could_be_private
                .unwrap_or(defaults.ignore_could_be_private),
            ignore_member_names: merged.ignore_member_names.unwrap_or_default(),
            ignore_decorator_names: merged.ignore_decorator_names.unwrap_or_default(),
            ignore_initializer_names: merged.ignore_initializer_names.unwrap_or_default(),
            skip_private: merged.skip_private.unwrap_or(defaults.skip_private),
        }
    }
}

/// Searches `start` and its ancestors for a configuration; first hit wins.
pub fn load_config(start: &Path) -> ScanResult<Option<(PathBuf, PartialConfig)>> {
    for dir in start.ancestors() {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.is_file() {
                let config = load_config_file(&path)?;
                return Ok(Some((path, config)));
            }
        }

        let package = dir.join("package.json");
        if package.is_file() {
            if let Some(config) = load_package_json(&package)? {
                return Ok(Some((package, config)));
            }
        }
    }
    Ok(None)
}

/// Reads an explicit config file: TOML for `.toml`, JSON otherwise.
pub fn load_config_file(path: &Path) -> ScanResult<PartialConfig> {
    let content = fs::read_to_string(path).with_path(path)?;
    let is_toml = path.extension().is_some_and(|ext| ext == "toml");
    if is_toml {
        toml::from_str(&content)
            .map_err(|e| ScanError::config(path, format!("invalid TOML config: {}", e)))
    } else {
        serde_json::from_str(&content)
            .map_err(|e| ScanError::config(path, format!("invalid JSON config: {}", e)))
    }
}

fn load_package_json(path: &Path) -> ScanResult<Option<PartialConfig>> {
    let content = fs::read_to_string(path).with_path(path)?;
    let mut package: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| ScanError::config(path, format!("invalid package.json: {}", e)))?;
    let Some(section) = package.get_mut(PACKAGE_JSON_KEY).map(serde_json::Value::take) else {
        return Ok(None);
    };
    serde_json::from_value(section)
        .map(Some)
        .map_err(|e| ScanError::config(path, format!("invalid \"{}\" section: {}", PACKAGE_JSON_KEY, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir(name: &str) -> PathBuf {
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "unused_members_config_{}_{}_{}",
            name,
            std::process::id(),
            id
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.project, PathBuf::from("tsconfig.json"));
        assert!(!config.fix);
        assert!(config.ignore_member_names.is_empty());
    }

    #[test]
    fn test_merge_precedence() {
        let file = PartialConfig {
            project: Some(PathBuf::from("app/tsconfig.json")),
            ignore_member_names: Some(vec!["render".into()]),
            skip_private: Some(true),
            ..Default::default()
        };
        let cli = PartialConfig {
            ignore_member_names: Some(vec!["ngOnInit".into()]),
            fix: Some(true),
            ..Default::default()
        };
        let config = ScanConfig::merge(Some(file), cli);
        assert_eq!(config.project, PathBuf::from("app/tsconfig.json"));
        assert_eq!(config.ignore_member_names, vec!["ngOnInit".to_string()]);
        assert!(config.skip_private);
        assert!(config.fix);
        assert!(!config.ignore_could_be_private);
    }

    #[test]
    fn test_load_toml_found_from_subdirectory() {
        let root = temp_dir("toml");
        fs::write(
            root.join("unused-members.toml"),
            "ignoreMemberNames = [\"render\"]\nskipPrivate = true\n",
        )
        .unwrap();
        let nested = root.join("packages/app");
        fs::create_dir_all(&nested).unwrap();

        let (path, config) = load_config(&nested).unwrap().unwrap();
        assert_eq!(path, root.join("unused-members.toml"));
        assert_eq!(config.ignore_member_names, Some(vec!["render".to_string()]));
        assert_eq!(config.skip_private, Some(true));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_package_json_section() {
        let root = temp_dir("pkg");
        fs::write(
            root.join("package.json"),
            r#"{ "name": "app", "ts-unused-class-members": { "ignoreDecoratorNames": ["Input"] } }"#,
        )
        .unwrap();
        let (_, config) = load_config(&root).unwrap().unwrap();
        assert_eq!(config.ignore_decorator_names, Some(vec!["Input".to_string()]));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_rc_file_wins_over_package_json() {
        let root = temp_dir("rc");
        fs::write(root.join(".unused-class-membersrc"), r#"{ "skipPrivate": true }"#).unwrap();
        fs::write(
            root.join("package.json"),
            r#"{ "ts-unused-class-members": { "skipPrivate": false } }"#,
        )
        .unwrap();
        let (path, config) = load_config(&root).unwrap().unwrap();
        assert!(path.ends_with(".unused-class-membersrc"));
        assert_eq!(config.skip_private, Some(true));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let root = temp_dir("bad");
        let path = root.join("cfg.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ScanError::Config { .. }));
        let _ = fs::remove_dir_all(&root);
    }
}
