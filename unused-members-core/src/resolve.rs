//! Name resolution across files and the reference index built on top of it.
//!
//! Imports are followed through relative paths, `paths` mappings and
//! `baseUrl`, then through re-exports. Every member access the parser recorded
//! is bound to the class its receiver resolves to. Receivers that cannot be
//! resolved are indexed by member name only and count for every member with
//! that name.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::hierarchy::ClassHierarchy;
use crate::model::{ClassId, FileId, ReferenceSite, Resolution};
use crate::parse::{Export, ImportKind, Receiver};
use crate::project::Project;
use crate::scan::{is_source_file, normalize_path};

const MAX_EXPORT_DEPTH: usize = 8;
const MAX_RECEIVER_DEPTH: usize = 16;

/// Extensions probed after a bare module path.
const PROBE_EXTENSIONS: &[&str] = &["ts", "tsx", "d.ts", "mts", "cts"];
const INDEX_FILES: &[&str] = &["index.ts", "index.tsx", "index.d.ts"];

/// What a name in a module scope refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Class(ClassId),
    /// `import * as ns`
    Namespace(FileId),
}

/// Static view of a receiver expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// An instance of this class (or of a subclass).
    Instance(ClassId),
    /// A class object or namespace; never an instance member access.
    Static,
    Unknown,
}

/// Module, export and type name resolution over a [`Project`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'p> {
    project: &'p Project,
}

impl<'p> Resolver<'p> {
    pub fn new(project: &'p Project) -> Self {
        Self { project }
    }

    /// File a module specifier imported from `from` refers to.
    pub fn resolve_module(&self, from: FileId, specifier: &str) -> Option<FileId> {
        let importer = &self.project.file(from).path;
        let options = self.project.options();
        let mut bases = Vec::new();

        if is_relative(specifier) {
            let dir = importer.parent().unwrap_or(Path::new(""));
            bases.push(dir.join(specifier));
        } else if specifier.starts_with('/') {
            bases.push(PathBuf::from(specifier));
        } else {
            let base_dir = options
                .base_url
                .clone()
                .unwrap_or_else(|| self.project.root().to_path_buf());
            for (pattern, targets) in &options.paths {
                let Some(rest) = match_path_pattern(pattern, specifier) else {
                    continue;
                };
                for target in targets {
                    bases.push(base_dir.join(target.replacen('*', rest, 1)));
                }
            }
            if let Some(base_url) = &options.base_url {
                bases.push(base_url.join(specifier));
            }
        }

        bases.iter().find_map(|base| self.probe(&normalize_path(base)))
    }

    fn probe(&self, base: &Path) -> Option<FileId> {
        let mut candidates = Vec::new();
        if is_source_file(base) {
            candidates.push(base.to_path_buf());
        }
        // `./a.js` in an ESM project points at `./a.ts`.
        let swapped: &[&str] = match base.extension().and_then(|e| e.to_str()) {
            Some("js") => &["ts", "tsx"],
            Some("jsx") => &["tsx"],
            Some("mjs") => &["mts"],
            Some("cjs") => &["cts"],
            _ => &[],
        };
        for ext in swapped {
            candidates.push(base.with_extension(ext));
        }
        for ext in PROBE_EXTENSIONS {
            candidates.push(with_suffix(base, ext));
        }
        for index in INDEX_FILES {
            candidates.push(base.join(index));
        }
        candidates
            .into_iter()
            .find_map(|candidate| self.project.file_id(&candidate))
    }

    /// What `name` exported from `file` refers to.
    pub fn resolve_export(&self, file: FileId, name: &str) -> Option<Symbol> {
        self.export_at(file, name, 0)
    }

    fn export_at(&self, file: FileId, name: &str, depth: usize) -> Option<Symbol> {
        if depth > MAX_EXPORT_DEPTH {
            return None;
        }
        let exports = &self.project.file(file).parsed.exports;
        for export in exports {
            match export {
                Export::Local { exported, local } if exported == name => {
                    return self.local_at(file, local, depth + 1);
                }
                Export::From {
                    exported,
                    imported,
                    source,
                } if exported == name => {
                    let module = self.resolve_module(file, source)?;
                    return self.export_at(module, imported, depth + 1);
                }
                _ => {}
            }
        }
        if name == "default" {
            return None;
        }
        exports.iter().find_map(|export| match export {
            Export::Star { source } => {
                let module = self.resolve_module(file, source)?;
                self.export_at(module, name, depth + 1)
            }
            _ => None,
        })
    }

    /// What `name` refers to in the top-level scope of `file`.
    pub fn resolve_local(&self, file: FileId, name: &str) -> Option<Symbol> {
        self.local_at(file, name, 0)
    }

    fn local_at(&self, file: FileId, name: &str, depth: usize) -> Option<Symbol> {
        if depth > MAX_EXPORT_DEPTH {
            return None;
        }
        let source = self.project.file(file);
        if let Some(index) = source.class_index(name) {
            return Some(Symbol::Class(ClassId::new(file, index)));
        }
        let import = source.parsed.imports.iter().find(|i| i.local == name)?;
        let module = self.resolve_module(file, &import.source)?;
        match &import.kind {
            ImportKind::Named(imported) => self.export_at(module, imported, depth + 1),
            ImportKind::Default => self.export_at(module, "default", depth + 1),
            ImportKind::Namespace => Some(Symbol::Namespace(module)),
        }
    }

    /// Class named by a type reference (`A` or `ns.A`) written in `file`.
    pub fn resolve_type(&self, file: FileId, name: &str) -> Option<ClassId> {
        let symbol = match name.split_once('.') {
            None => self.resolve_local(file, name)?,
            Some((namespace, rest)) => match self.resolve_local(file, namespace)? {
                Symbol::Namespace(module) if !rest.contains('.') => {
                    self.resolve_export(module, rest)?
                }
                _ => return None,
            },
        };
        match symbol {
            Symbol::Class(id) => Some(id),
            Symbol::Namespace(_) => None,
        }
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Text matched by the `*` of a `paths` pattern, or `""` for an exact match.
fn match_path_pattern<'s>(pattern: &str, specifier: &'s str) -> Option<&'s str> {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => specifier.strip_prefix(prefix)?.strip_suffix(suffix),
        None => (pattern == specifier).then_some(""),
    }
}

fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Per-file view used while binding receivers.
struct FileScope<'p> {
    file: FileId,
    bindings: HashMap<&'p str, Vec<&'p Receiver>>,
}

/// Every member reference in the project, bound to declaring classes.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    exact: HashMap<ClassId, HashMap<String, Vec<ReferenceSite>>>,
    by_name: HashMap<String, Vec<ReferenceSite>>,
}

impl ReferenceIndex {
    pub fn build(project: &Project, hierarchy: &ClassHierarchy) -> Self {
        let binder = Binder {
            project,
            resolver: Resolver::new(project),
            hierarchy,
        };
        let mut index = Self::default();
        let mut unresolved = 0usize;

        for file in project.files() {
            let mut scope = FileScope {
                file: file.id,
                bindings: HashMap::new(),
            };
            for binding in &file.parsed.bindings {
                scope
                    .bindings
                    .entry(binding.name.as_str())
                    .or_default()
                    .push(&binding.source);
            }

            for access in &file.parsed.accesses {
                let site = ReferenceSite {
                    file: file.id,
                    enclosing_class: access.enclosing_class.clone(),
                    line: access.line,
                    resolution: Resolution::Exact,
                };
                let targets = match binder.receiver(&scope, &access.receiver, 0) {
                    Resolved::Instance(class) => {
                        hierarchy.declaring_classes(project, class, &access.name)
                    }
                    Resolved::Static => continue,
                    Resolved::Unknown => Vec::new(),
                };
                // A receiver typed as a base class may still reach members
                // only a subclass declares (after `instanceof` narrowing).
                if targets.is_empty() {
                    unresolved += 1;
                    index
                        .by_name
                        .entry(access.name.clone())
                        .or_default()
                        .push(ReferenceSite {
                            resolution: Resolution::NameOnly,
                            ..site
                        });
                    continue;
                }
                for target in targets {
                    index
                        .exact
                        .entry(target)
                        .or_default()
                        .entry(access.name.clone())
                        .or_default()
                        .push(site.clone());
                }
            }
        }

        debug!(unresolved, "reference index built");
        index
    }

    /// References that may target member `name` of `class`: exact sites
    /// first, then name-only sites.
    pub fn references(&self, class: ClassId, name: &str) -> Vec<&ReferenceSite> {
        let exact = self
            .exact
            .get(&class)
            .and_then(|members| members.get(name))
            .into_iter()
            .flatten();
        let by_name = self.by_name.get(name).into_iter().flatten();
        exact.chain(by_name).collect()
    }
}

struct Binder<'p, 'h> {
    project: &'p Project,
    resolver: Resolver<'p>,
    hierarchy: &'h ClassHierarchy,
}

impl Binder<'_, '_> {
    fn receiver(&self, scope: &FileScope<'_>, receiver: &Receiver, depth: usize) -> Resolved {
        if depth > MAX_RECEIVER_DEPTH {
            return Resolved::Unknown;
        }
        match receiver {
            Receiver::This(class) => self.own_class(scope.file, class),
            Receiver::StaticThis => Resolved::Static,
            Receiver::Super(class) => match self.own_class(scope.file, class) {
                Resolved::Instance(id) => self
                    .hierarchy
                    .base(id)
                    .map_or(Resolved::Unknown, Resolved::Instance),
                _ => Resolved::Unknown,
            },
            Receiver::Ident(name) => match scope.bindings.get(name.as_str()) {
                Some(sources) => {
                    let mut result = None;
                    for source in sources {
                        let resolved = self.receiver(scope, source, depth + 1);
                        match result {
                            None => result = Some(resolved),
                            Some(previous) if previous == resolved => {}
                            Some(_) => return Resolved::Unknown,
                        }
                    }
                    result.unwrap_or(Resolved::Unknown)
                }
                None if self.resolver.resolve_local(scope.file, name).is_some() => {
                    Resolved::Static
                }
                None => Resolved::Unknown,
            },
            Receiver::Typed(name) => self
                .resolver
                .resolve_type(scope.file, name)
                .map_or(Resolved::Unknown, Resolved::Instance),
            Receiver::Member(object, name) => self.member_value(scope, object, name, depth),
            Receiver::Call(callee) => match callee.as_ref() {
                Receiver::Member(object, name) => self.member_value(scope, object, name, depth),
                _ => Resolved::Unknown,
            },
            Receiver::Unknown => Resolved::Unknown,
        }
    }

    fn own_class(&self, file: FileId, name: &str) -> Resolved {
        self.project
            .file(file)
            .class_index(name)
            .map_or(Resolved::Unknown, |index| {
                Resolved::Instance(ClassId::new(file, index))
            })
    }

    /// Value of `object.name`, typed through the member's declared type.
    fn member_value(
        &self,
        scope: &FileScope<'_>,
        object: &Receiver,
        name: &str,
        depth: usize,
    ) -> Resolved {
        let Resolved::Instance(class) = self.receiver(scope, object, depth + 1) else {
            return Resolved::Unknown;
        };
        for owner in self.hierarchy.chain(class) {
            if let Some(member) = self.project.class(owner).member(name) {
                return member
                    .declared_type
                    .as_deref()
                    .and_then(|ty| self.resolver.resolve_type(owner.file, ty))
                    .map_or(Resolved::Unknown, Resolved::Instance);
            }
        }
        Resolved::Unknown
    }
}
