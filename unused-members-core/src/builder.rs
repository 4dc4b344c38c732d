//! Builder pattern API for class member analysis.
//!
//! ```rust,ignore
//! use unused_members_core::prelude::*;
//!
//! let result = UnusedMembers::new(ScanConfig::default())
//!     .base_dir("/path/to/app")
//!     .shard(Shard::new(4, 2)?)
//!     .analyze()?;
//!
//! for member in &result.findings {
//!     println!("{}.{}: {}", member.class_name, member.member_name, member.reason);
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::analyze::{analyze, Findings, Progress};
use crate::config::ScanConfig;
use crate::project::Project;
use crate::shard::Shard;

/// Builder for configuring a run.
#[derive(Debug, Clone)]
pub struct UnusedMembers {
    config: ScanConfig,
    /// Directory a relative `project` path is taken from.
    base_dir: PathBuf,
    shard: Shard,
}

impl UnusedMembers {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            base_dir: PathBuf::from("."),
            shard: Shard::single(),
        }
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn shard(mut self, shard: Shard) -> Self {
        self.shard = shard;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Path of the `tsconfig.json` this run loads.
    pub fn manifest_path(&self) -> PathBuf {
        self.base_dir.join(&self.config.project)
    }

    /// Loads and parses the project.
    pub fn load(&self) -> Result<Project> {
        let manifest = self.manifest_path();
        Project::load(&manifest)
            .with_context(|| format!("Failed to load project {}", manifest.display()))
    }

    /// Run the analysis and return results.
    pub fn analyze(&self) -> Result<AnalysisResult> {
        self.analyze_with_progress(|_| {})
    }

    /// Like [`UnusedMembers::analyze`], reporting each file before it is
    /// analyzed.
    pub fn analyze_with_progress<F>(&self, on_progress: F) -> Result<AnalysisResult>
    where
        F: FnMut(&Progress<'_>),
    {
        let project = self.load()?;
        self.analyze_project(project, on_progress)
    }

    /// Analyzes an already loaded project.
    pub fn analyze_project<F>(&self, project: Project, on_progress: F) -> Result<AnalysisResult>
    where
        F: FnMut(&Progress<'_>),
    {
        let findings = analyze(&project, &self.config, &self.shard, on_progress)
            .context("Analysis failed")?;
        Ok(AnalysisResult { project, findings })
    }

    /// Applies the findings of `result` to the source files.
    #[cfg(feature = "fix")]
    pub fn fix(&self, result: &AnalysisResult, dry_run: bool) -> Result<crate::fix::FixResult> {
        crate::fix::apply_fixes(&result.project, &result.findings, dry_run)
            .context("Failed to apply fixes")
    }
}

/// Result of running the analysis.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// The parsed program (needed by the fix step).
    pub project: Project,
    pub findings: Findings,
}

impl AnalysisResult {
    pub fn root(&self) -> &Path {
        self.project.root()
    }

    pub fn has_offenders(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn offending_count(&self) -> usize {
        self.findings.len()
    }

    pub fn files_checked(&self) -> usize {
        self.findings.files_checked()
    }
}
