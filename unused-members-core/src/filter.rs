//! Eligibility rules deciding which classes and members are analyzed at all.

use std::fmt;

use crate::config::ScanConfig;
use crate::model::{Accessibility, ClassDeclaration, Member};

/// Why a whole class is left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassSkip {
    IgnoreComment,
    Abstract,
    /// Interface members must stay public.
    ImplementsInterface,
}

impl fmt::Display for ClassSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IgnoreComment => write!(f, "ignore comment"),
            Self::Abstract => write!(f, "abstract class"),
            Self::ImplementsInterface => write!(f, "implements an interface"),
        }
    }
}

/// Why a member is left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberSkip {
    IgnoreComment,
    Abstract,
    Protected,
    AlreadyPrivate,
    IgnoredInitializer(String),
    IgnoredName,
    IgnoredDecorator(String),
}

impl fmt::Display for MemberSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IgnoreComment => write!(f, "ignore comment"),
            Self::Abstract => write!(f, "abstract member"),
            Self::Protected => write!(f, "protected member"),
            Self::AlreadyPrivate => write!(f, "private member"),
            Self::IgnoredInitializer(name) => write!(f, "initializer {}() is ignored", name),
            Self::IgnoredName => write!(f, "member name is ignored"),
            Self::IgnoredDecorator(name) => write!(f, "decorator @{} is ignored", name),
        }
    }
}

pub fn should_skip_class(class: &ClassDeclaration) -> Option<ClassSkip> {
    if class.ignored {
        Some(ClassSkip::IgnoreComment)
    } else if class.is_abstract {
        Some(ClassSkip::Abstract)
    } else if !class.implements.is_empty() {
        Some(ClassSkip::ImplementsInterface)
    } else {
        None
    }
}

pub fn should_skip_member(member: &Member, config: &ScanConfig) -> Option<MemberSkip> {
    if member.ignored {
        return Some(MemberSkip::IgnoreComment);
    }
    if member.is_abstract {
        return Some(MemberSkip::Abstract);
    }
    match member.accessibility {
        Accessibility::Protected => return Some(MemberSkip::Protected),
        Accessibility::Private if config.skip_private => {
            return Some(MemberSkip::AlreadyPrivate)
        }
        _ => {}
    }
    if let Some(call) = &member.initializer_call {
        if config.ignore_initializer_names.contains(call) {
            return Some(MemberSkip::IgnoredInitializer(call.clone()));
        }
    }
    if config.ignore_member_names.contains(&member.name) {
        return Some(MemberSkip::IgnoredName);
    }
    member
        .decorators
        .iter()
        .find(|d| config.ignore_decorator_names.contains(d))
        .map(|d| MemberSkip::IgnoredDecorator(d.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemberEdit, MemberKind, PropertyForm};

    fn class() -> ClassDeclaration {
        ClassDeclaration {
            name: "A".into(),
            line: 1,
            is_abstract: false,
            base: None,
            implements: Vec::new(),
            leading_comment: None,
            ignored: false,
            members: Vec::new(),
        }
    }

    fn member(name: &str) -> Member {
        Member {
            name: name.into(),
            kind: MemberKind::Property(PropertyForm::Field),
            accessibility: Accessibility::Public,
            is_abstract: false,
            decorators: Vec::new(),
            initializer_call: None,
            leading_comment: None,
            ignored: false,
            line: 2,
            declared_type: None,
            edit: MemberEdit::default(),
        }
    }

    #[test]
    fn test_plain_class_is_analyzed() {
        assert_eq!(should_skip_class(&class()), None);
    }

    #[test]
    fn test_class_skips() {
        let mut ignored = class();
        ignored.ignored = true;
        assert_eq!(should_skip_class(&ignored), Some(ClassSkip::IgnoreComment));

        let mut abstract_class = class();
        abstract_class.is_abstract = true;
        assert_eq!(should_skip_class(&abstract_class), Some(ClassSkip::Abstract));

        let mut implementing = class();
        implementing.implements.push("IA".into());
        assert_eq!(
            should_skip_class(&implementing),
            Some(ClassSkip::ImplementsInterface)
        );
    }

    #[test]
    fn test_member_marker_abstract_protected() {
        let config = ScanConfig::default();
        let mut m = member("x");
        m.ignored = true;
        assert_eq!(should_skip_member(&m, &config), Some(MemberSkip::IgnoreComment));

        let mut m = member("x");
        m.is_abstract = true;
        assert_eq!(should_skip_member(&m, &config), Some(MemberSkip::Abstract));

        let mut m = member("x");
        m.accessibility = Accessibility::Protected;
        assert_eq!(should_skip_member(&m, &config), Some(MemberSkip::Protected));
    }

    #[test]
    fn test_private_only_skipped_with_flag() {
        let mut m = member("x");
        m.accessibility = Accessibility::Private;
        assert_eq!(should_skip_member(&m, &ScanConfig::default()), None);

        let config = ScanConfig {
            skip_private: true,
            ..Default::default()
        };
        assert_eq!(should_skip_member(&m, &config), Some(MemberSkip::AlreadyPrivate));
    }

    #[test]
    fn test_allowlists() {
        let config = ScanConfig {
            ignore_member_names: vec!["ngOnInit".into()],
            ignore_decorator_names: vec!["Input".into()],
            ignore_initializer_names: vec!["reaction".into()],
            ..Default::default()
        };
        assert_eq!(
            should_skip_member(&member("ngOnInit"), &config),
            Some(MemberSkip::IgnoredName)
        );

        let mut decorated = member("value");
        decorated.decorators = vec!["Output".into(), "Input".into()];
        assert_eq!(
            should_skip_member(&decorated, &config),
            Some(MemberSkip::IgnoredDecorator("Input".into()))
        );

        let mut initialized = member("dispose");
        initialized.initializer_call = Some("reaction".into());
        assert_eq!(
            should_skip_member(&initialized, &config),
            Some(MemberSkip::IgnoredInitializer("reaction".into()))
        );

        assert_eq!(should_skip_member(&member("other"), &config), None);
    }
}
