//! A circuit file whose location and identity have been resolved.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use circa_common::{ContentHash, SourceName};

use crate::file_data::ResolvedFileData;

/// Metadata about the installed library a file belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryInfo {
    /// The library name, used as the first segment of its files' source names.
    pub name: String,
    /// The library version, when known.
    pub version: Option<String>,
    /// Canonical root directory of the library.
    pub root: PathBuf,
}

/// A circuit file mapped to its canonical location and logical name.
///
/// Created by the [`FileResolver`](crate::FileResolver) on first reference.
/// Everything except the parsed data is fixed at construction; the parsed data
/// is attached once, after the parser has run.
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    source_name: SourceName,
    absolute_path: PathBuf,
    last_modification_ms: u64,
    content_hash: ContentHash,
    library: Option<LibraryInfo>,
    data: OnceLock<Arc<ResolvedFileData>>,
}

impl ResolvedFile {
    /// Creates a resolved file with no parsed data attached.
    pub fn new(
        source_name: SourceName,
        absolute_path: PathBuf,
        last_modification_ms: u64,
        content_hash: ContentHash,
        library: Option<LibraryInfo>,
    ) -> Self {
        Self {
            source_name,
            absolute_path,
            last_modification_ms,
            content_hash,
            library,
            data: OnceLock::new(),
        }
    }

    /// The logical name of the file.
    pub fn source_name(&self) -> &SourceName {
        &self.source_name
    }

    /// The canonical absolute path of the file.
    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Modification time in milliseconds since the Unix epoch.
    pub fn last_modification_ms(&self) -> u64 {
        self.last_modification_ms
    }

    /// Hash of the file content at resolution time.
    pub fn content_hash(&self) -> ContentHash {
        self.content_hash
    }

    /// The library this file belongs to, if it is not a project file.
    pub fn library(&self) -> Option<&LibraryInfo> {
        self.library.as_ref()
    }

    /// Attaches parsed data to the file.
    ///
    /// The first attachment wins; later calls return the data already attached.
    pub fn attach_data(&self, data: Arc<ResolvedFileData>) -> &Arc<ResolvedFileData> {
        self.data.get_or_init(|| data)
    }

    /// The parsed data, if it has been attached.
    pub fn data(&self) -> Option<&Arc<ResolvedFileData>> {
        self.data.get()
    }
}
