//! The scan: selects files, walks their classes and collects findings.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use tracing::{debug, info};

use crate::classify::classify;
use crate::config::ScanConfig;
use crate::error::{ScanError, ScanResult};
use crate::filter::{should_skip_class, should_skip_member};
use crate::hierarchy::ClassHierarchy;
use crate::model::{ClassId, MemberRef, OffendingMember};
use crate::project::{Project, SourceFile};
use crate::resolve::{ReferenceIndex, Resolver};
use crate::scan::PathScope;
use crate::shard::Shard;

/// Position of the file about to be analyzed.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// 0-based.
    pub index: usize,
    pub total: usize,
    pub relative_path: &'a str,
}

/// Offending members in file order, then class order, then member order.
#[derive(Debug, Clone, Default)]
pub struct Findings {
    members: Vec<OffendingMember>,
    files_checked: usize,
}

/// Offending members of one class.
#[derive(Debug, Clone)]
pub struct ClassFindings<'a> {
    pub class_name: &'a str,
    pub members: Vec<&'a OffendingMember>,
}

/// Offending members of one file, grouped by class.
#[derive(Debug, Clone)]
pub struct FileFindings<'a> {
    pub file: &'a Path,
    pub relative_path: &'a str,
    pub classes: Vec<ClassFindings<'a>>,
}

impl Findings {
    pub fn new(members: Vec<OffendingMember>, files_checked: usize) -> Self {
        Self {
            members,
            files_checked,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OffendingMember> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn as_slice(&self) -> &[OffendingMember] {
        &self.members
    }

    /// Number of files that were analyzed.
    pub fn files_checked(&self) -> usize {
        self.files_checked
    }

    /// Findings grouped by file, then class, in report order.
    pub fn by_file(&self) -> Vec<FileFindings<'_>> {
        let mut files: Vec<FileFindings<'_>> = Vec::new();
        for member in &self.members {
            let starts_file = files
                .last()
                .map_or(true, |f| f.file != member.file.as_path());
            if starts_file {
                files.push(FileFindings {
                    file: &member.file,
                    relative_path: &member.relative_path,
                    classes: Vec::new(),
                });
            }
            let Some(file) = files.last_mut() else {
                continue;
            };
            let starts_class = file
                .classes
                .last()
                .map_or(true, |c| c.class_name != member.class_name);
            if starts_class {
                file.classes.push(ClassFindings {
                    class_name: &member.class_name,
                    members: Vec::new(),
                });
            }
            if let Some(class) = file.classes.last_mut() {
                class.members.push(member);
            }
        }
        files
    }
}

impl<'a> IntoIterator for &'a Findings {
    type Item = &'a OffendingMember;
    type IntoIter = std::slice::Iter<'a, OffendingMember>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// Files to analyze: in scope, in the shard, not ignored, not declarations.
pub fn select_files<'p>(
    project: &'p Project,
    config: &ScanConfig,
    shard: &Shard,
) -> ScanResult<Vec<&'p SourceFile>> {
    let ignore = config
        .ignore_file_regex
        .as_deref()
        .filter(|pattern| !pattern.is_empty())
        .map(|pattern| Regex::new(pattern).map_err(|e| ScanError::invalid_regex(pattern, &e)))
        .transpose()?;
    let scope = PathScope::new(config.path.as_deref(), project.root())?;

    Ok(project
        .files()
        .iter()
        .filter(|file| !file.is_declaration)
        .filter(|file| scope.matches(&file.relative_path))
        .filter(|file| shard.contains(&file.relative_path))
        .filter(|file| {
            ignore
                .as_ref()
                .map_or(true, |re| !re.is_match(&file.path.to_string_lossy()))
        })
        .collect())
}

/// Runs the analysis over the selected files of `project`.
///
/// References are gathered from the whole program, so a member used only
/// from a file outside the shard or the `path` scope still counts as used.
pub fn analyze<F>(
    project: &Project,
    config: &ScanConfig,
    shard: &Shard,
    mut on_progress: F,
) -> ScanResult<Findings>
where
    F: FnMut(&Progress<'_>),
{
    let files = select_files(project, config, shard)?;
    info!(
        files = files.len(),
        total = project.files().len(),
        shard = %shard,
        "starting analysis"
    );

    let resolver = Resolver::new(project);
    let hierarchy = ClassHierarchy::build(project, &resolver);
    let index = ReferenceIndex::build(project, &hierarchy);

    let mut members = Vec::new();
    for (i, file) in files.iter().enumerate() {
        on_progress(&Progress {
            index: i,
            total: files.len(),
            relative_path: &file.relative_path,
        });
        analyze_file(project, file, &hierarchy, &index, config, &mut members);
    }

    info!(
        files = files.len(),
        offending = members.len(),
        "analysis complete"
    );
    Ok(Findings::new(members, files.len()))
}

fn analyze_file(
    project: &Project,
    file: &SourceFile,
    hierarchy: &ClassHierarchy,
    index: &ReferenceIndex,
    config: &ScanConfig,
    out: &mut Vec<OffendingMember>,
) {
    for (class_index, class) in file.classes().iter().enumerate() {
        if let Some(reason) = should_skip_class(class) {
            debug!(
                file = %file.relative_path,
                class = %class.name,
                reason = %reason,
                "skipping class"
            );
            continue;
        }

        let id = ClassId::new(file.id, class_index);
        let inherited: HashSet<&str> = hierarchy.inherited_member_names(project, id);

        for (member_index, member) in class.members.iter().enumerate() {
            if inherited.contains(member.name.as_str()) {
                continue;
            }
            if let Some(reason) = should_skip_member(member, config) {
                debug!(
                    class = %class.name,
                    member = %member.name,
                    reason = %reason,
                    "skipping member"
                );
                continue;
            }

            let references = index.references(id, &member.name);
            let result = classify(member, &class.name, file.id, references, config);
            let Some(reason) = result.reason() else {
                continue;
            };
            out.push(OffendingMember {
                file: file.path.clone(),
                relative_path: file.relative_path.clone(),
                class_name: class.name.clone(),
                member_name: member.name.clone(),
                kind: member.kind,
                line: member.line,
                reason,
                target: MemberRef {
                    class: id,
                    index: member_index as u32,
                },
            });
        }
    }
}
