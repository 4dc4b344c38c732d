//! Turns the reference sites of one member into a classification.

use crate::config::ScanConfig;
use crate::model::{Accessibility, Classification, FileId, Member, ReferenceSite};

/// Classifies an eligible member from the references to its declaration.
///
/// A member with no references is unused whatever its accessibility. A
/// referenced member is a candidate for `private` only when every reference
/// sits in the body of its own class in the declaring file.
pub fn classify<'r>(
    member: &Member,
    class_name: &str,
    declaring_file: FileId,
    references: impl IntoIterator<Item = &'r ReferenceSite>,
    config: &ScanConfig,
) -> Classification {
    let mut references = references.into_iter().peekable();
    if references.peek().is_none() {
        return Classification::Unused;
    }
    if member.accessibility == Accessibility::Private || config.ignore_could_be_private {
        return Classification::Ok;
    }
    let only_internal = references.all(|site| {
        site.file == declaring_file && site.enclosing_class.as_deref() == Some(class_name)
    });
    if only_internal {
        Classification::ShouldBePrivate
    } else {
        Classification::Ok
    }
}
