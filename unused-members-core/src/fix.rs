//! Write-back of findings: removes unused members and narrows members that
//! should be private.
//!
//! Never panics: a file whose edits cannot be applied is reported in
//! [`FixResult::errors`] and left untouched while the other files are written.

use std::collections::BTreeMap;
use std::fs;

use serde::Serialize;
use tracing::info;

use crate::analyze::Findings;
use crate::error::{ScanError, ScanResult};
use crate::logging::log_scan_error;
use crate::model::{FileId, OffendingMember, Reason, Span};
use crate::project::Project;

/// Result of a fix operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FixResult {
    /// Relative paths of files written (or that would be, in dry-run mode).
    pub files_written: Vec<String>,
    pub members_removed: usize,
    pub members_narrowed: usize,
    pub errors: Vec<String>,
}

/// One replacement in a file's text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TextEdit {
    span: Span,
    replacement: String,
    /// The edit deletes whole lines; a blank line doubled by it is collapsed.
    whole_lines: bool,
}

impl TextEdit {
    fn delete(span: Span) -> Self {
        Self {
            span,
            replacement: String::new(),
            whole_lines: false,
        }
    }

    fn replace(span: Span, replacement: &str) -> Self {
        Self {
            span,
            replacement: replacement.to_string(),
            whole_lines: false,
        }
    }
}

/// Applies every finding to its source file. Edits are grouped per file and
/// each file is written once.
pub fn apply_fixes(project: &Project, findings: &Findings, dry_run: bool) -> ScanResult<FixResult> {
    let mut result = FixResult::default();
    let mode = if dry_run { "DRY-RUN" } else { "FIX" };

    let mut per_file: BTreeMap<FileId, Vec<&OffendingMember>> = BTreeMap::new();
    for finding in findings {
        per_file.entry(finding.target.class.file).or_default().push(finding);
    }

    for (file_id, members) in per_file {
        let file = project.file(file_id);
        let mut edits = Vec::new();
        let mut removed = 0;
        let mut narrowed = 0;

        for finding in &members {
            let member = project.member(finding.target);
            match finding.reason {
                Reason::Unused if member.kind.is_parameter_property() => {
                    edits.extend(member.edit.modifiers.iter().copied().map(TextEdit::delete));
                    removed += 1;
                }
                Reason::Unused => {
                    edits.push(removal_edit(&file.text, member.edit.removal));
                    removed += 1;
                }
                Reason::ShouldBePrivate => {
                    edits.push(match member.edit.accessibility {
                        Some(keyword) => TextEdit::replace(keyword, "private"),
                        None => TextEdit::replace(
                            Span::new(member.edit.insert_at, member.edit.insert_at),
                            "private ",
                        ),
                    });
                    narrowed += 1;
                }
            }
            let action = match finding.reason {
                Reason::Unused => "remove",
                Reason::ShouldBePrivate => "make private",
            };
            if dry_run {
                println!(
                    "[DRY-RUN] Would {} {}.{} ({}:{})",
                    action, finding.class_name, finding.member_name, file.relative_path, finding.line
                );
            } else {
                println!(
                    "[FIX] {} {}.{} ({}:{})",
                    action, finding.class_name, finding.member_name, file.relative_path, finding.line
                );
            }
        }

        let updated = match apply_edits(&file.text, edits) {
            Ok(text) => text,
            Err(message) => {
                let err = ScanError::fix(&file.path, message);
                log_scan_error(&err);
                result.errors.push(err.to_string());
                continue;
            }
        };

        if !dry_run {
            if let Err(e) = fs::write(&file.path, updated) {
                let err = ScanError::io(&file.path, e);
                log_scan_error(&err);
                result.errors.push(err.to_string());
                continue;
            }
        }
        result.files_written.push(file.relative_path.clone());
        result.members_removed += removed;
        result.members_narrowed += narrowed;
    }

    info!(
        mode,
        files = result.files_written.len(),
        removed = result.members_removed,
        narrowed = result.members_narrowed,
        errors = result.errors.len(),
        "fix complete"
    );
    Ok(result)
}

/// Deletes a declaration, taking its whole lines when nothing else shares them.
fn removal_edit(text: &str, span: Span) -> TextEdit {
    match owned_lines(text, span) {
        Some(lines) => TextEdit {
            span: lines,
            replacement: String::new(),
            whole_lines: true,
        },
        None => TextEdit::delete(inline_span(text, span).unwrap_or(span)),
    }
}

/// `span` widened over the blanks that separate it from its neighbors on
/// the same line: the ones before it, or the ones after it when it starts
/// the line.
fn inline_span(text: &str, span: Span) -> Option<Span> {
    let is_blank = |c: char| c == ' ' || c == '\t';
    let before = text.get(..span.start)?;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let kept = before.trim_end_matches(is_blank).len();
    if kept > line_start {
        return Some(Span::new(kept, span.end));
    }
    let rest = text.get(span.end..)?.trim_start_matches(is_blank);
    Some(Span::new(span.start, text.len() - rest.len()))
}

/// The full lines covering `span`, if only whitespace surrounds it on them.
fn owned_lines(text: &str, span: Span) -> Option<Span> {
    let before = text.get(..span.start)?;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    if !before[line_start..].trim().is_empty() {
        return None;
    }
    let after = text.get(span.end..)?;
    let line_end = after.find('\n').map_or(text.len(), |i| span.end + i + 1);
    if !text[span.end..line_end].trim().is_empty() {
        return None;
    }
    Some(Span::new(line_start, line_end))
}

/// Applies edits back-to-front. Fails on overlapping or out-of-range spans.
fn apply_edits(text: &str, mut edits: Vec<TextEdit>) -> Result<String, String> {
    edits.sort_by_key(|e| (e.span.start, e.span.end));
    for edit in &edits {
        let Span { start, end } = edit.span;
        if start > end || end > text.len() || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            return Err(format!("edit {}..{} is outside the file", start, end));
        }
    }
    for pair in edits.windows(2) {
        if pair[1].span.start < pair[0].span.end {
            return Err(format!(
                "overlapping edits at {}..{} and {}..{}",
                pair[0].span.start, pair[0].span.end, pair[1].span.start, pair[1].span.end
            ));
        }
    }

    let mut out = text.to_string();
    for edit in edits.iter().rev() {
        out.replace_range(edit.span.start..edit.span.end, &edit.replacement);
        if edit.whole_lines {
            collapse_blank_line(&mut out, edit.span.start);
        }
    }
    Ok(out)
}

/// Drops the line starting at `at` when it and the line before it are blank.
fn collapse_blank_line(text: &mut String, at: usize) {
    if at == 0 {
        return;
    }
    let before = &text[..at - 1];
    let prev_start = before.rfind('\n').map_or(0, |i| i + 1);
    if !before[prev_start..].trim().is_empty() {
        return;
    }
    let Some(len) = text[at..].find('\n') else {
        return;
    };
    if text[at..at + len].trim().is_empty() {
        text.replace_range(at..at + len + 1, "");
    }
}
