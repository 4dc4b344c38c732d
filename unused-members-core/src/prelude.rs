//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use unused_members_core::prelude::*;
//! ```

// Core analysis types
pub use crate::analyze::{analyze, Findings};
pub use crate::error::{ScanError, ScanResult};
pub use crate::model::{OffendingMember, Reason};
pub use crate::project::Project;
pub use crate::shard::Shard;

// Configuration
pub use crate::config::{load_config, PartialConfig, ScanConfig};

// Builder API
pub use crate::builder::{AnalysisResult, UnusedMembers};

// Reporting
pub use crate::report::{print_json, print_plain};

// Fix functionality
#[cfg(feature = "fix")]
pub use crate::fix::{apply_fixes, FixResult};
