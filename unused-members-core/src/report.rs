//! Output formatting - plaintext and JSON.

use std::fmt::Write as _;

use serde_json::{json, Value};

use crate::analyze::Findings;

/// Plain report: per file a blank line and its path, then each class name
/// followed by `- member: reason` lines.
pub fn format_plain(findings: &Findings) -> String {
    let mut out = String::new();
    for file in findings.by_file() {
        out.push('\n');
        out.push_str(file.relative_path);
        out.push('\n');
        for class in &file.classes {
            out.push_str(class.class_name);
            out.push('\n');
            for member in &class.members {
                let _ = writeln!(out, "- {}: {}", member.member_name, member.reason);
            }
        }
    }
    out.push('\n');
    out
}

/// Prints the plain report to stdout.
pub fn print_plain(findings: &Findings) {
    print!("{}", format_plain(findings));
}

/// `{ "offending": [...], "count": n }`
pub fn to_json(findings: &Findings) -> Value {
    json!({
        "offending": findings.as_slice(),
        "count": findings.len(),
    })
}

/// Prints the JSON report.
///
/// Falls back to the plain report if serialization fails.
pub fn print_json(findings: &Findings) {
    match serde_json::to_string_pretty(&to_json(findings)) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            print_plain(findings);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassId, FileId, MemberKind, MemberRef, OffendingMember, PropertyForm, Reason};
    use std::path::PathBuf;

    fn offending(file: &str, class: &str, member: &str, reason: Reason) -> OffendingMember {
        OffendingMember {
            file: PathBuf::from("/repo").join(file),
            relative_path: file.to_string(),
            class_name: class.to_string(),
            member_name: member.to_string(),
            kind: MemberKind::Property(PropertyForm::Field),
            line: 2,
            reason,
            target: MemberRef {
                class: ClassId::new(FileId(0), 0),
                index: 0,
            },
        }
    }

    #[test]
    fn test_plain_groups_by_file_and_class() {
        let findings = Findings::new(
            vec![
                offending("a.ts", "A", "x", Reason::ShouldBePrivate),
                offending("a.ts", "A", "fn", Reason::Unused),
                offending("b.ts", "B", "y", Reason::Unused),
            ],
            2,
        );
        let text = format_plain(&findings);
        assert_eq!(
            text,
            "\na.ts\nA\n- x: should be private\n- fn: unused\n\nb.ts\nB\n- y: unused\n\n"
        );
    }

    #[test]
    fn test_json_shape() {
        let findings = Findings::new(vec![offending("a.ts", "A", "x", Reason::Unused)], 1);
        let value = to_json(&findings);
        assert_eq!(value["count"], 1);
        let first = &value["offending"][0];
        assert_eq!(first["class"], "A");
        assert_eq!(first["member"], "x");
        assert_eq!(first["reason"], "unused");
        assert_eq!(first["relative_path"], "a.ts");
        assert_eq!(first["kind"], "property");
        assert!(first.get("target").is_none());
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(format_plain(&Findings::default()), "\n");
    }
}
