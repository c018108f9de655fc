//! Include resolution for project and library files.
//!
//! Resolution order for an include written in file `F`:
//!
//! 1. `./…` and `../…` are resolved against `F`'s directory and must stay
//!    within the root `F` belongs to (the project root or its library root).
//! 2. If the first path segment names a library, the rest of the specifier is
//!    resolved inside that library.
//! 3. Otherwise the specifier is tried relative to `F`'s directory, then
//!    relative to `F`'s root.
//!
//! Project files are named by their project-relative path and library files by
//! `<library>/<library-relative path>`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use circa_common::{modification_millis, ContentHash, SourceName};
use tracing::trace;

use crate::error::ResolveError;
use crate::resolved_file::{LibraryInfo, ResolvedFile};

/// Maps include specifiers to resolved files.
///
/// Implementations must be shareable across the threads that build the
/// dependency graph.
pub trait ImportResolver: Send + Sync {
    /// Resolves `specifier`, written inside `from`, to a file.
    fn resolve_import(
        &self,
        from: &ResolvedFile,
        specifier: &str,
    ) -> Result<Arc<ResolvedFile>, ResolveError>;
}

/// An explicitly configured library.
#[derive(Debug, Clone)]
struct Library {
    root: PathBuf,
    version: Option<String>,
}

/// Filesystem-backed resolver for a single project and its libraries.
///
/// Libraries are either registered explicitly with [`with_library`](Self::with_library)
/// or discovered as sub-directories of a library directory such as
/// `node_modules`. Explicit registrations take precedence.
#[derive(Debug, Clone)]
pub struct FileResolver {
    project_root: PathBuf,
    libraries: BTreeMap<String, Library>,
    library_dirs: Vec<PathBuf>,
    /// Canonical path to the modification time and hash seen in a previous run.
    known_hashes: HashMap<PathBuf, (u64, ContentHash)>,
}

impl FileResolver {
    /// Creates a resolver rooted at `project_root`.
    pub fn new(project_root: &Path) -> Result<Self, ResolveError> {
        Ok(Self {
            project_root: canonicalize(project_root)?,
            libraries: BTreeMap::new(),
            library_dirs: Vec::new(),
            known_hashes: HashMap::new(),
        })
    }

    /// Registers a library whose files are included as `<name>/<path>`.
    pub fn with_library(
        mut self,
        name: impl Into<String>,
        root: &Path,
        version: Option<String>,
    ) -> Result<Self, ResolveError> {
        let root = canonicalize(root)?;
        self.libraries.insert(name.into(), Library { root, version });
        Ok(self)
    }

    /// Adds a directory whose sub-directories are treated as libraries.
    ///
    /// The directory does not need to exist yet.
    pub fn with_library_dir(mut self, dir: &Path) -> Self {
        let dir = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        self.library_dirs.push(dir);
        self
    }

    /// Seeds fingerprints from a previous run.
    ///
    /// A file whose modification time still equals the recorded one takes the
    /// recorded hash without being read. Any other file is read and hashed.
    pub fn with_known_hashes<I>(mut self, known: I) -> Self
    where
        I: IntoIterator<Item = (PathBuf, u64, ContentHash)>,
    {
        self.known_hashes.extend(
            known
                .into_iter()
                .map(|(path, modified, hash)| (path, (modified, hash))),
        );
        self
    }

    /// The canonical project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Looks up a library by name.
    pub fn library(&self, name: &str) -> Option<LibraryInfo> {
        if name.is_empty() || name == "." || name == ".." {
            return None;
        }
        if let Some(lib) = self.libraries.get(name) {
            return Some(LibraryInfo {
                name: name.to_string(),
                version: lib.version.clone(),
                root: lib.root.clone(),
            });
        }
        self.library_dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_dir())
            .and_then(|candidate| std::fs::canonicalize(candidate).ok())
            .map(|root| LibraryInfo {
                name: name.to_string(),
                version: None,
                root,
            })
    }

    /// Resolves a file of the project itself, given by absolute or
    /// project-relative path. Used for seed files.
    pub fn resolve_project_file(&self, path: &Path) -> Result<Arc<ResolvedFile>, ResolveError> {
        let outside = || ResolveError::OutsideProject {
            path: path.to_path_buf(),
            root: self.project_root.clone(),
        };
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };
        let mut candidate = normalize(&joined).ok_or_else(outside)?;
        if !candidate.starts_with(&self.project_root) {
            candidate = canonicalize(&candidate)?;
        }
        if !candidate.starts_with(&self.project_root) {
            return Err(outside());
        }
        let name = relative_name(&self.project_root, None, &candidate).ok_or_else(outside)?;
        self.load(name, &candidate, None)
    }

    /// Resolves a file by its logical source name.
    pub fn resolve_source_name(&self, name: &str) -> Result<Arc<ResolvedFile>, ResolveError> {
        let missing = || ResolveError::MissingSource {
            name: name.to_string(),
        };

        if let Some(candidate) = within(&self.project_root, &self.project_root.join(name)) {
            if candidate.is_file() {
                return self.load_within(&self.project_root, None, &candidate);
            }
        }

        let (first, rest) = name.split_once('/').ok_or_else(missing)?;
        let lib = self.library(first).ok_or_else(missing)?;
        let candidate = within(&lib.root, &lib.root.join(rest))
            .filter(|p| p.is_file())
            .ok_or_else(missing)?;
        let lib_root = lib.root.clone();
        self.load_within(&lib_root, Some(lib), &candidate)
    }

    /// Loads `candidate`, naming it relative to `root` and prefixed with the
    /// library name for library files.
    fn load_within(
        &self,
        root: &Path,
        library: Option<LibraryInfo>,
        candidate: &Path,
    ) -> Result<Arc<ResolvedFile>, ResolveError> {
        let prefix = library.as_ref().map(|l| l.name.clone());
        let name = relative_name(root, prefix.as_deref(), candidate).ok_or_else(|| {
            ResolveError::OutsideProject {
                path: candidate.to_path_buf(),
                root: root.to_path_buf(),
            }
        })?;
        self.load(name, candidate, library)
    }

    /// Fingerprints a file and builds the resolved record.
    ///
    /// The file is read only when no known hash matches its modification time.
    fn load(
        &self,
        source_name: SourceName,
        path: &Path,
        library: Option<LibraryInfo>,
    ) -> Result<Arc<ResolvedFile>, ResolveError> {
        let absolute_path = canonicalize(path)?;
        let io_err = |source| ResolveError::Io {
            path: absolute_path.clone(),
            source,
        };
        let metadata = std::fs::metadata(&absolute_path).map_err(io_err)?;
        let last_modification_ms = modification_millis(&metadata);
        let content_hash = match self.known_hashes.get(&absolute_path) {
            Some(&(modified, hash)) if modified == last_modification_ms => {
                trace!(%source_name, "modification time unchanged, reusing hash");
                hash
            }
            _ => ContentHash::from_bytes(&std::fs::read(&absolute_path).map_err(io_err)?),
        };
        trace!(%source_name, path = %absolute_path.display(), %content_hash, "resolved file");
        Ok(Arc::new(ResolvedFile::new(
            source_name,
            absolute_path,
            last_modification_ms,
            content_hash,
            library,
        )))
    }
}

impl ImportResolver for FileResolver {
    fn resolve_import(
        &self,
        from: &ResolvedFile,
        specifier: &str,
    ) -> Result<Arc<ResolvedFile>, ResolveError> {
        let library = from.library();
        let root = library.map_or(self.project_root.as_path(), |l| l.root.as_path());
        let from_dir = from.absolute_path().parent().unwrap_or(root);

        let not_found = || ResolveError::NotFound {
            specifier: specifier.to_string(),
            requested_by: from.source_name().clone(),
        };
        let escapes = |root: &Path| ResolveError::EscapesRoot {
            specifier: specifier.to_string(),
            requested_by: from.source_name().clone(),
            root: root.to_path_buf(),
        };

        if Path::new(specifier).is_absolute() {
            let candidate =
                within(&self.project_root, Path::new(specifier)).ok_or_else(|| escapes(&self.project_root))?;
            if !candidate.is_file() {
                return Err(not_found());
            }
            return self.load_within(&self.project_root, None, &candidate);
        }

        if is_explicitly_relative(specifier) {
            let candidate = within(root, &from_dir.join(specifier)).ok_or_else(|| escapes(root))?;
            if !candidate.is_file() {
                return Err(not_found());
            }
            return self.load_within(root, library.cloned(), &candidate);
        }

        if let Some((first, rest)) = specifier.split_once('/') {
            if let Some(lib) = self.library(first) {
                let candidate = within(&lib.root, &lib.root.join(rest)).ok_or_else(|| escapes(&lib.root))?;
                if !candidate.is_file() {
                    return Err(not_found());
                }
                let lib_root = lib.root.clone();
                return self.load_within(&lib_root, Some(lib), &candidate);
            }
        }

        let beside = within(root, &from_dir.join(specifier)).ok_or_else(|| escapes(root))?;
        if beside.is_file() {
            return self.load_within(root, library.cloned(), &beside);
        }
        if let Some(rooted) = within(root, &root.join(specifier)) {
            if rooted.is_file() {
                return self.load_within(root, library.cloned(), &rooted);
            }
        }
        Err(not_found())
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf, ResolveError> {
    std::fs::canonicalize(path).map_err(|source| ResolveError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_explicitly_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with(".\\")
        || specifier.starts_with("..\\")
}

/// Lexically normalizes `path` and returns it only if it stays inside `root`.
fn within(root: &Path, path: &Path) -> Option<PathBuf> {
    normalize(path).filter(|p| p.starts_with(root) && p.as_path() != root)
}

/// Removes `.` components and folds `..` into their parent.
///
/// Returns `None` if a `..` would climb above the filesystem root.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    Some(out)
}

fn relative_name(root: &Path, prefix: Option<&str>, path: &Path) -> Option<SourceName> {
    let relative = path.strip_prefix(root).ok()?;
    SourceName::from_relative_path(prefix, relative)
}
