//! Core data model: classes, members, reference sites and findings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Literal token that opts the next class or member out of analysis.
pub const IGNORE_MARKER: &str = "unused-class-members-ignore-next";

/// Byte range into a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Declared accessibility of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Accessibility {
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "private" => Self::Private,
            "protected" => Self::Protected,
            _ => Self::Public,
        }
    }
}

impl fmt::Display for Accessibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Protected => write!(f, "protected"),
            Self::Private => write!(f, "private"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessorKind {
    Get,
    Set,
}

/// How a property is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyForm {
    /// `x = 1;` / `x: T;`
    Field,
    /// `get x()` / `set x(v)`
    Accessor(AccessorKind),
    /// `constructor(private x: T)`
    Parameter,
}

/// Closed set of member kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Method,
    Property(PropertyForm),
}

impl MemberKind {
    pub fn is_method(&self) -> bool {
        matches!(self, Self::Method)
    }

    pub fn is_parameter_property(&self) -> bool {
        matches!(self, Self::Property(PropertyForm::Parameter))
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Method => "method",
            Self::Property(PropertyForm::Field) => "property",
            Self::Property(PropertyForm::Accessor(AccessorKind::Get)) => "getter",
            Self::Property(PropertyForm::Accessor(AccessorKind::Set)) => "setter",
            Self::Property(PropertyForm::Parameter) => "parameter property",
        };
        write!(f, "{}", label)
    }
}

/// Source locations the fix step edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberEdit {
    /// Whole declaration: decorators, directly preceding JSDoc, overload
    /// signatures and a trailing `;`/`,`.
    pub removal: Span,
    /// The `public`/`protected`/`private` keyword, when written.
    pub accessibility: Option<Span>,
    /// Where `private ` goes when no keyword is written.
    pub insert_at: usize,
    /// Parameter property modifiers (`private`, `readonly`, `override`),
    /// each including its trailing whitespace.
    pub modifiers: Vec<Span>,
}

/// An instance member declared directly in a class body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    pub accessibility: Accessibility,
    pub is_abstract: bool,
    /// Full decorator names (`Input`, `ns.Dec`).
    pub decorators: Vec<String>,
    /// Callee of a bare call initializer: `fetch = reaction(...)` -> `reaction`.
    pub initializer_call: Option<String>,
    pub leading_comment: Option<String>,
    /// Leading comment carries [`IGNORE_MARKER`].
    pub ignored: bool,
    /// 1-based line of the member name.
    pub line: usize,
    /// Property type, inferred `new` type, or method return type.
    pub declared_type: Option<String>,
    pub edit: MemberEdit,
}

/// A named class declaration and its own instance members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDeclaration {
    pub name: String,
    pub line: usize,
    pub is_abstract: bool,
    /// `extends` expression text (`Base`, `ns.Base`).
    pub base: Option<String>,
    pub implements: Vec<String>,
    pub leading_comment: Option<String>,
    pub ignored: bool,
    /// Own instance members in source order.
    pub members: Vec<Member>,
}

impl ClassDeclaration {
    /// Whether the class declares an instance member with this name.
    pub fn declares(&self, name: &str) -> bool {
        self.members.iter().any(|m| m.name == name)
    }

    /// First member with this name (getter before setter in source order).
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Distinct member names.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name.as_str())
    }
}

/// Index of a file within a [`crate::project::Project`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

/// A class: file plus position in that file's class list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId {
    pub file: FileId,
    pub index: u32,
}

impl ClassId {
    pub fn new(file: FileId, index: usize) -> Self {
        Self {
            file,
            index: index as u32,
        }
    }
}

/// How a reference site was bound to a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Receiver type resolved to the declaring class or a descendant.
    Exact,
    /// Receiver unknown; counted for every member with the name.
    NameOnly,
}

/// A usage location of a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSite {
    pub file: FileId,
    /// Nearest enclosing named class declaration.
    pub enclosing_class: Option<String>,
    pub line: usize,
    pub resolution: Resolution,
}

/// Why a member was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    #[serde(rename = "unused")]
    Unused,
    #[serde(rename = "should be private")]
    ShouldBePrivate,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unused => write!(f, "unused"),
            Self::ShouldBePrivate => write!(f, "should be private"),
        }
    }
}

/// Outcome of classifying one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Ok,
    Unused,
    ShouldBePrivate,
}

impl Classification {
    pub fn reason(self) -> Option<Reason> {
        match self {
            Self::Ok => None,
            Self::Unused => Some(Reason::Unused),
            Self::ShouldBePrivate => Some(Reason::ShouldBePrivate),
        }
    }
}

/// Handle back to a member declaration inside the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    pub class: ClassId,
    pub index: u32,
}

/// A flagged member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffendingMember {
    pub file: PathBuf,
    pub relative_path: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(rename = "member")]
    pub member_name: String,
    #[serde(serialize_with = "serialize_label")]
    pub kind: MemberKind,
    pub line: usize,
    pub reason: Reason,
    #[serde(skip_serializing)]
    pub target: MemberRef,
}

fn serialize_label<S: serde::Serializer>(kind: &MemberKind, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(kind)
}
