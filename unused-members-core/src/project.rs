//! The parsed program: every project source file with its extracted facts.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::info;

use crate::error::{IoResultExt, ScanResult};
use crate::model::{ClassDeclaration, ClassId, FileId, Member, MemberRef};
use crate::parse::{parse_source, ParsedFile};
use crate::scan::{
    is_declaration_file, normalize_path, relative_path, CompilerOptions, Manifest,
};

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: FileId,
    /// Normalized absolute path.
    pub path: PathBuf,
    /// Path relative to the project root, `/` separated.
    pub relative_path: String,
    pub text: String,
    /// `.d.ts` files take part in resolution but are never analyzed.
    pub is_declaration: bool,
    pub parsed: ParsedFile,
}

impl SourceFile {
    pub fn classes(&self) -> &[ClassDeclaration] {
        &self.parsed.classes
    }

    /// First class declared with this name.
    pub fn class_index(&self, name: &str) -> Option<usize> {
        self.parsed.classes.iter().position(|c| c.name == name)
    }
}

/// All source files of a project, sorted by path.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    options: CompilerOptions,
    files: Vec<SourceFile>,
    by_path: HashMap<PathBuf, FileId>,
}

impl Project {
    /// Loads the manifest, gathers its files and parses them in parallel.
    pub fn load(manifest_path: &Path) -> ScanResult<Self> {
        let manifest = Manifest::load(manifest_path)?;
        let paths = manifest.gather_source_files()?;
        info!(
            manifest = %manifest.path.display(),
            files = paths.len(),
            "loading project"
        );

        let sources = paths
            .par_iter()
            .map(|path| {
                let text = fs::read_to_string(path).with_path(path)?;
                let parsed = parse_source(path, &text)?;
                Ok((path.clone(), text, parsed))
            })
            .collect::<ScanResult<Vec<_>>>()?;

        Ok(Self::assemble(manifest.root, manifest.options, sources))
    }

    /// Builds a project from in-memory sources; paths are relative to `root`.
    pub fn from_sources<P, S>(
        root: impl Into<PathBuf>,
        sources: impl IntoIterator<Item = (P, S)>,
    ) -> ScanResult<Self>
    where
        P: AsRef<Path>,
        S: Into<String>,
    {
        Self::from_sources_with_options(root, CompilerOptions::default(), sources)
    }

    /// Like [`Project::from_sources`] with explicit module resolution options.
    pub fn from_sources_with_options<P, S>(
        root: impl Into<PathBuf>,
        options: CompilerOptions,
        sources: impl IntoIterator<Item = (P, S)>,
    ) -> ScanResult<Self>
    where
        P: AsRef<Path>,
        S: Into<String>,
    {
        let root = normalize_path(&root.into());
        let mut parsed = Vec::new();
        for (path, text) in sources {
            let path = normalize_path(&root.join(path.as_ref()));
            let text = text.into();
            let file = parse_source(&path, &text)?;
            parsed.push((path, text, file));
        }
        Ok(Self::assemble(root, options, parsed))
    }

    fn assemble(
        root: PathBuf,
        options: CompilerOptions,
        mut sources: Vec<(PathBuf, String, ParsedFile)>,
    ) -> Self {
        sources.sort_by(|a, b| a.0.cmp(&b.0));
        let files: Vec<SourceFile> = sources
            .into_iter()
            .enumerate()
            .map(|(i, (path, text, parsed))| SourceFile {
                id: FileId(i as u32),
                relative_path: relative_path(&root, &path),
                is_declaration: is_declaration_file(&path),
                path,
                text,
                parsed,
            })
            .collect();
        let by_path = files.iter().map(|f| (f.path.clone(), f.id)).collect();
        Self {
            root,
            options,
            files,
            by_path,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    /// File at a normalized path.
    pub fn file_id(&self, path: &Path) -> Option<FileId> {
        self.by_path.get(path).copied()
    }

    pub fn class(&self, id: ClassId) -> &ClassDeclaration {
        &self.file(id.file).parsed.classes[id.index as usize]
    }

    pub fn member(&self, target: MemberRef) -> &Member {
        &self.class(target.class).members[target.index as usize]
    }

    /// Every class in the project.
    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.files.iter().flat_map(|file| {
            (0..file.parsed.classes.len()).map(move |index| ClassId::new(file.id, index))
        })
    }
}
