//! Project discovery: `tsconfig.json` reading and source file gathering.
//!
//! Performance characteristics:
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip)
//! - Parallel file filtering via Rayon's `par_bridge`
//! - Deterministic output (sorted) regardless of traversal order

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use serde::Deserialize;
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{IoResultExt, ScanError, ScanResult};

/// Directories never descended into.
const EXCLUDED_DIRS: &[&str] = &[".git", "node_modules", "bower_components", "jspm_packages"];

/// Directories excluded when a manifest does not list `exclude`.
const DEFAULT_EXCLUDES: &[&str] = &["node_modules", "bower_components", "jspm_packages"];

/// Recognized source extensions.
const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];

const MAX_EXTENDS_DEPTH: usize = 8;

/// Raw `tsconfig.json` contents we care about.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTsConfig {
    extends: Option<String>,
    compiler_options: Option<RawCompilerOptions>,
    files: Option<Vec<String>>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    base_url: Option<String>,
    paths: Option<BTreeMap<String, Vec<String>>>,
    out_dir: Option<String>,
}

/// Module resolution settings from `compilerOptions`.
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    /// Absolute `baseUrl`.
    pub base_url: Option<PathBuf>,
    /// `paths` mappings, targets relative to `baseUrl` (or the manifest dir).
    pub paths: Vec<(String, Vec<String>)>,
}

/// A loaded project manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    /// Directory containing the manifest.
    pub root: PathBuf,
    pub options: CompilerOptions,
    files: Vec<PathBuf>,
    include: GlobSet,
    exclude: GlobSet,
}

/// Removes `//` and `/* */` comments and trailing commas, leaving strings intact.
pub fn strip_jsonc(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }
    strip_trailing_commas(&out)
}

fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.get(i + 1) {
                    out.push(*escaped);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if !matches!(next, Some('}') | Some(']')) {
                out.push(c);
            }
        } else {
            out.push(c);
        }
        i += 1;
    }
    out
}

fn read_raw(path: &Path) -> ScanResult<RawTsConfig> {
    let text = fs::read_to_string(path).with_path(path)?;
    serde_json::from_str(&strip_jsonc(&text))
        .map_err(|e| ScanError::config(path, format!("invalid manifest: {}", e)))
}

/// Lexically normalizes a path (`.` and `..` components) without touching disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path relative to `root` with `/` separators.
pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// `.d.ts`, `.d.mts`, `.d.cts`
pub fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts")
        })
}

fn glob(pattern: &str) -> ScanResult<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| ScanError::invalid_pattern(pattern, &e))
}

/// Turns a manifest include/exclude entry into glob patterns relative to the root.
fn manifest_patterns(entry: &str) -> Vec<String> {
    let entry = entry.trim_start_matches("./").trim_end_matches('/');
    if entry.is_empty() {
        return vec!["**/*".to_string()];
    }
    let has_meta = entry.contains(['*', '?', '[', '{']);
    let last = entry.rsplit('/').next().unwrap_or(entry);
    if !has_meta && !last.contains('.') {
        // Bare directory.
        return vec![entry.to_string(), format!("{}/**/*", entry)];
    }
    let mut patterns = vec![entry.to_string()];
    if entry.ends_with("**") {
        patterns.push(format!("{}/*", entry));
    }
    patterns
}

fn build_set(entries: &[String]) -> ScanResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for entry in entries {
        for pattern in manifest_patterns(entry) {
            builder.add(glob(&pattern)?);
        }
    }
    builder
        .build()
        .map_err(|e| ScanError::invalid_pattern(entries.join(", "), &e))
}

impl Manifest {
    /// Loads `tsconfig.json` (JSONC), following relative `extends` chains.
    pub fn load(path: &Path) -> ScanResult<Self> {
        if !path.is_file() {
            return Err(ScanError::config(path, "project manifest not found"));
        }
        let path = normalize_path(&absolute(path)?);
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut raw = read_raw(&path)?;
        let mut options = raw.compiler_options.clone().unwrap_or_default();
        let mut options_dir = root.clone();
        let mut parent_ref = raw.extends.clone().map(|e| (root.clone(), e));
        let mut depth = 0;

        while let Some((dir, extends)) = parent_ref.take() {
            depth += 1;
            if depth > MAX_EXTENDS_DEPTH {
                warn!(manifest = %path.display(), "extends chain too deep, ignoring rest");
                break;
            }
            if !extends.starts_with('.') {
                warn!(extends = %extends, "non-relative extends not followed");
                break;
            }
            let mut parent_path = normalize_path(&dir.join(&extends));
            if parent_path.extension().is_none() {
                parent_path.set_extension("json");
            }
            let parent = read_raw(&parent_path)?;
            let parent_dir = parent_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dir.clone());

            if let Some(parent_opts) = &parent.compiler_options {
                if options.base_url.is_none() && parent_opts.base_url.is_some() {
                    options.base_url = parent_opts.base_url.clone();
                    options_dir = parent_dir.clone();
                }
                if options.paths.is_none() {
                    options.paths = parent_opts.paths.clone();
                }
                if options.out_dir.is_none() {
                    options.out_dir = parent_opts.out_dir.clone();
                }
            }
            if raw.files.is_none() && raw.include.is_none() {
                raw.files = parent.files.clone();
                raw.include = parent.include.clone();
            }
            if raw.exclude.is_none() {
                raw.exclude = parent.exclude.clone();
            }
            parent_ref = parent.extends.clone().map(|e| (parent_dir, e));
        }

        let base_url = options
            .base_url
            .as_deref()
            .map(|base| normalize_path(&options_dir.join(base)));
        let paths = options
            .paths
            .unwrap_or_default()
            .into_iter()
            .collect::<Vec<_>>();

        let files = raw
            .files
            .clone()
            .unwrap_or_default()
            .iter()
            .map(|f| normalize_path(&root.join(f)))
            .collect::<Vec<_>>();
        let include = match (&raw.include, raw.files.is_some()) {
            (Some(include), _) => include.clone(),
            (None, true) => Vec::new(),
            (None, false) => vec!["**/*".to_string()],
        };
        let mut exclude = raw
            .exclude
            .clone()
            .unwrap_or_else(|| DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect());
        if raw.exclude.is_none() {
            if let Some(out_dir) = &options.out_dir {
                exclude.push(out_dir.clone());
            }
        }

        Ok(Self {
            include: build_set(&include)?,
            exclude: build_set(&exclude)?,
            files,
            options: CompilerOptions { base_url, paths },
            root,
            path,
        })
    }

    /// Whether a root-relative path is part of the project.
    pub fn includes(&self, relative: &str) -> bool {
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }

    /// All project source files, sorted.
    pub fn gather_source_files(&self) -> ScanResult<Vec<PathBuf>> {
        let excludes: HashSet<&str> = EXCLUDED_DIRS.iter().copied().collect();

        let mut files = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| !is_excluded_dir(e, &excludes))
            .par_bridge()
            .filter_map(|entry| match entry {
                Ok(e) => {
                    let path = e.path();
                    if !e.file_type().is_file() || !is_source_file(path) {
                        return None;
                    }
                    let relative = relative_path(&self.root, path);
                    self.includes(&relative).then(|| Ok(path.to_path_buf()))
                }
                Err(e) => Some(Err(ScanError::io(
                    e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone()),
                    std::io::Error::other(e.to_string()),
                ))),
            })
            .collect::<ScanResult<Vec<_>>>()?;

        for file in &self.files {
            if file.is_file() && !files.contains(file) {
                files.push(file.clone());
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }
}

/// Checks if a directory entry should be pruned (excluded from traversal).
#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

fn absolute(path: &Path) -> ScanResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().with_path(path)?;
    Ok(cwd.join(path))
}

/// The `path` setting: a single file or a directory subtree.
#[derive(Debug, Clone)]
pub struct PathScope {
    set: Option<GlobSet>,
}

impl PathScope {
    /// Everything.
    pub fn all() -> Self {
        Self { set: None }
    }

    /// A path ending in `.ts`/`.tsx` selects one file; anything else is a
    /// directory whose `.ts`/`.tsx` files are selected recursively. Relative
    /// paths are taken from `root`.
    pub fn new(path: Option<&str>, root: &Path) -> ScanResult<Self> {
        let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) else {
            return Ok(Self::all());
        };
        let resolved = normalize_path(&root.join(path));
        let relative = relative_path(root, &resolved);
        let relative = escape_glob(relative.trim_end_matches('/'));

        let is_file = Path::new(path)
            .extension()
            .is_some_and(|ext| ext == "ts" || ext == "tsx");
        let pattern = if is_file {
            relative
        } else if relative.is_empty() {
            "**/*.{ts,tsx}".to_string()
        } else {
            format!("{}/**/*.{{ts,tsx}}", relative)
        };

        let mut builder = GlobSetBuilder::new();
        builder.add(glob(&pattern)?);
        let set = builder
            .build()
            .map_err(|e| ScanError::invalid_pattern(pattern.clone(), &e))?;
        Ok(Self { set: Some(set) })
    }

    /// Whether a root-relative path is in scope.
    pub fn matches(&self, relative: &str) -> bool {
        self.set.as_ref().map_or(true, |set| set.is_match(relative))
    }
}

fn escape_glob(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '{' | '}') {
            out.push('[');
            out.push(c);
            out.push(']');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir()
            .join("unused_members_scan_test")
            .join(format!("{}_{}_{}", name, std::process::id(), id));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_strip_jsonc() {
        let text = r#"{
  // comment
  "a": "http://x", /* block */
  "b": [1, 2,],
}"#;
        let value: serde_json::Value = serde_json::from_str(&strip_jsonc(text)).unwrap();
        assert_eq!(value["a"], "http://x");
        assert_eq!(value["b"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c/./d.ts")),
            PathBuf::from("/a/c/d.ts")
        );
    }

    #[test]
    fn test_declaration_files() {
        assert!(is_declaration_file(Path::new("types/global.d.ts")));
        assert!(!is_declaration_file(Path::new("src/a.ts")));
        assert!(is_source_file(Path::new("src/a.tsx")));
        assert!(!is_source_file(Path::new("src/a.js")));
    }

    #[test]
    fn test_gather_default_include_and_pruning() {
        let dir = create_temp_dir("gather");
        write(&dir.join("tsconfig.json"), "{ \"compilerOptions\": {} }");
        write(&dir.join("src/a.ts"), "export class A {}");
        write(&dir.join("src/view.tsx"), "export class V {}");
        write(&dir.join("src/readme.md"), "# no");
        write(&dir.join("node_modules/lib/index.ts"), "export class L {}");

        let manifest = Manifest::load(&dir.join("tsconfig.json")).unwrap();
        let files = manifest.gather_source_files().unwrap();
        let relative: Vec<String> = files.iter().map(|f| relative_path(&manifest.root, f)).collect();
        assert_eq!(relative, vec!["src/a.ts", "src/view.tsx"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_include_exclude_and_extends() {
        let dir = create_temp_dir("include");
        write(
            &dir.join("tsconfig.base.json"),
            r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@app/*": ["src/*"] } } }"#,
        );
        write(
            &dir.join("tsconfig.json"),
            r#"{
  "extends": "./tsconfig.base.json",
  // only src
  "include": ["src"],
  "exclude": ["src/generated"],
}"#,
        );
        write(&dir.join("src/a.ts"), "");
        write(&dir.join("src/generated/b.ts"), "");
        write(&dir.join("scripts/c.ts"), "");

        let manifest = Manifest::load(&dir.join("tsconfig.json")).unwrap();
        assert_eq!(manifest.options.base_url.as_deref(), Some(manifest.root.as_path()));
        assert_eq!(manifest.options.paths.len(), 1);
        let files = manifest.gather_source_files().unwrap();
        let relative: Vec<String> = files.iter().map(|f| relative_path(&manifest.root, f)).collect();
        assert_eq!(relative, vec!["src/a.ts"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_manifest_is_config_error() {
        let err = Manifest::load(Path::new("/definitely/not/here/tsconfig.json")).unwrap_err();
        assert!(matches!(err, ScanError::Config { .. }));
    }

    #[test]
    fn test_path_scope_directory_and_file() {
        let root = Path::new("/project");
        let dir = PathScope::new(Some("src/models"), root).unwrap();
        assert!(dir.matches("src/models/user.ts"));
        assert!(dir.matches("src/models/deep/view.tsx"));
        assert!(!dir.matches("src/other/user.ts"));

        let file = PathScope::new(Some("./src/models/user.ts"), root).unwrap();
        assert!(file.matches("src/models/user.ts"));
        assert!(!file.matches("src/models/account.ts"));

        let all = PathScope::new(Some("."), root).unwrap();
        assert!(all.matches("anything/at/all.ts"));
        assert!(PathScope::new(None, root).unwrap().matches("x.mts"));
    }
}
