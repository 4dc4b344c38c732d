//! unused-members-core: unused and should-be-private class member detection
//! for TypeScript projects.
//!
//! The library loads a `tsconfig.json` project, parses every source file with
//! tree-sitter, resolves member accesses across files and classifies each
//! instance member of each class:
//!
//! - **unused**: no reference anywhere in the program
//! - **should be private**: referenced only from inside its own class body
//!
//! Files can be partitioned into shards so large repositories are checked by
//! independent CI jobs, and findings can be written back to the sources.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use unused_members_core::prelude::*;
//!
//! let result = UnusedMembers::new(ScanConfig::default())
//!     .base_dir("/path/to/app")
//!     .analyze()?;
//!
//! print_plain(&result.findings);
//! ```
//!
//! # Module Organization
//!
//! - [`scan`]: `tsconfig.json` loading and source file discovery
//! - [`parse`]: syntax facts per file (classes, imports, accesses)
//! - [`project`]: the parsed program
//! - [`resolve`]: module/type resolution and the reference index
//! - [`hierarchy`]: class inheritance graph
//! - [`filter`], [`classify`]: eligibility and classification rules
//! - [`analyze`]: the scan itself
//! - [`shard`]: deterministic file partitioning
//! - [`fix`]: write-back of findings
//! - [`builder`]: fluent API for configuring a run
//! - [`error`]: typed error handling
//!
//! # Cargo Features
//!
//! - `fix` (default): enable write-back of findings

pub mod analyze;
pub mod builder;
pub mod classify;
pub mod config;
pub mod error;
pub mod filter;
pub mod hierarchy;
pub mod logging;
pub mod model;
pub mod parse;
pub mod prelude;
pub mod project;
pub mod report;
pub mod resolve;
pub mod scan;
pub mod shard;

#[cfg(feature = "fix")]
pub mod fix;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{IoResultExt, ScanError, ScanResult};

// Builder API
pub use builder::{AnalysisResult, UnusedMembers};

// Configuration
pub use config::{load_config, load_config_file, PartialConfig, ScanConfig};

// Analysis
pub use analyze::{analyze, select_files, ClassFindings, FileFindings, Findings, Progress};
pub use classify::classify;
pub use filter::{should_skip_class, should_skip_member, ClassSkip, MemberSkip};
pub use hierarchy::ClassHierarchy;
pub use resolve::{ReferenceIndex, Resolver};

// Data model
pub use model::{
    Accessibility, AccessorKind, ClassDeclaration, ClassId, Classification, FileId, Member,
    MemberKind, OffendingMember, PropertyForm, Reason, ReferenceSite, Resolution, IGNORE_MARKER,
};

// Logging
pub use logging::{init_structured_logging, log_scan_error};

// Parsing and project loading
pub use parse::{parse_source, ParsedFile};
pub use project::{Project, SourceFile};
pub use scan::{Manifest, PathScope};

// Reporting
pub use report::{format_plain, print_json, print_plain};

// Sharding
pub use shard::{is_in_shard, java_hash, shard_of, Shard};

// Feature-gated re-exports
#[cfg(feature = "fix")]
pub use fix::{apply_fixes, FixResult};

#[cfg(test)]
mod tests;
