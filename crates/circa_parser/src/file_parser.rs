//! Two-tier cached parsing of circuit files.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use circa_cache::CompileCache;
use circa_common::ContentHash;
use circa_source::{ResolvedFile, ResolvedFileData, SignalInfo};
use dashmap::DashMap;
use tracing::{debug, trace, warn};

use crate::error::ParseError;
use crate::grammar::GrammarParser;

/// Supplies the parsed declarations of a resolved file.
///
/// The dependency graph consumes parsing through this trait.
pub trait ParseFile: Send + Sync {
    /// Returns the parsed data of `file`, attaching it to the file.
    fn parse_file(&self, file: &ResolvedFile) -> Result<Arc<ResolvedFileData>, ParseError>;
}

/// Counters describing where parse results came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStats {
    /// Results served from the in-process map.
    pub memory_hits: usize,
    /// Results adopted from the durable compile cache.
    pub cache_hits: usize,
    /// Invocations of the grammar parser.
    pub grammar_runs: usize,
}

/// Parses circuit files, consulting an in-process map keyed by content hash
/// and then the durable [`CompileCache`] before invoking the grammar.
///
/// One `FileParser` lives for one build run. Identical content reached under
/// several paths is parsed once, and repeated requests for the same content
/// hash return the same `Arc`.
pub struct FileParser<'a> {
    grammar: &'a dyn GrammarParser,
    cache: &'a CompileCache,
    by_hash: DashMap<ContentHash, Arc<ResolvedFileData>>,
    memory_hits: AtomicUsize,
    cache_hits: AtomicUsize,
    grammar_runs: AtomicUsize,
}

impl<'a> FileParser<'a> {
    /// Creates a parser backed by `grammar` and the durable `cache`.
    pub fn new(grammar: &'a dyn GrammarParser, cache: &'a CompileCache) -> Self {
        Self {
            grammar,
            cache,
            by_hash: DashMap::new(),
            memory_hits: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            grammar_runs: AtomicUsize::new(0),
        }
    }

    /// Parses `content`, read from `path`, whose hash is `content_hash`.
    pub fn parse(
        &self,
        content: &str,
        path: &Path,
        content_hash: ContentHash,
    ) -> Result<Arc<ResolvedFileData>, ParseError> {
        if let Some(data) = self.lookup(path, content_hash) {
            return Ok(data);
        }
        self.run_grammar(content, path, content_hash)
    }

    /// Resolves the input signals of `template` in the file at `path` for the
    /// given parameter values. Results are never cached.
    pub fn parse_template_inputs(
        &self,
        path: &Path,
        template: &str,
        parameter_values: &[i64],
    ) -> Result<Vec<SignalInfo>, ParseError> {
        let content = read(path)?;
        let data = self.parse(&content, path, ContentHash::from_bytes(content.as_bytes()))?;
        if !data.templates.contains_key(template) {
            return Err(ParseError::UnknownTemplate {
                path: path.to_path_buf(),
                template: template.to_string(),
            });
        }
        self.grammar
            .template_inputs(&content, path, template, parameter_values)
            .map_err(|diagnostics| ParseError::Syntax {
                path: path.to_path_buf(),
                diagnostics,
            })
    }

    /// Where results have come from so far.
    pub fn stats(&self) -> ParserStats {
        ParserStats {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            grammar_runs: self.grammar_runs.load(Ordering::Relaxed),
        }
    }

    /// Checks the in-process map, then the durable cache.
    fn lookup(&self, path: &Path, content_hash: ContentHash) -> Option<Arc<ResolvedFileData>> {
        if let Some(data) = self.by_hash.get(&content_hash) {
            self.memory_hits.fetch_add(1, Ordering::Relaxed);
            trace!(path = %path.display(), "parse result reused in memory");
            return Some(Arc::clone(data.value()));
        }
        let entry = self
            .cache
            .get_entry_by_path(path)
            .filter(|entry| entry.content_hash == content_hash)?;
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        debug!(file = %entry.source_name, "parse result adopted from compile cache");
        let data = Arc::new(entry.resolved_data.clone());
        Some(Arc::clone(
            self.by_hash.entry(content_hash).or_insert(data).value(),
        ))
    }

    fn run_grammar(
        &self,
        content: &str,
        path: &Path,
        content_hash: ContentHash,
    ) -> Result<Arc<ResolvedFileData>, ParseError> {
        self.grammar_runs.fetch_add(1, Ordering::Relaxed);
        debug!(path = %path.display(), "parsing");
        let data = self
            .grammar
            .parse(content, path)
            .map_err(|diagnostics| ParseError::Syntax {
                path: path.to_path_buf(),
                diagnostics,
            })?;
        Ok(Arc::clone(
            self.by_hash
                .entry(content_hash)
                .or_insert_with(|| Arc::new(data))
                .value(),
        ))
    }
}

impl ParseFile for FileParser<'_> {
    fn parse_file(&self, file: &ResolvedFile) -> Result<Arc<ResolvedFileData>, ParseError> {
        if let Some(data) = file.data() {
            return Ok(Arc::clone(data));
        }
        let path = file.absolute_path();
        let data = match self.lookup(path, file.content_hash()) {
            Some(data) => data,
            None => {
                // Results are keyed by the bytes actually parsed, which may be
                // newer than the fingerprint taken at resolution.
                let content = read(path)?;
                let read_hash = ContentHash::from_bytes(content.as_bytes());
                if read_hash != file.content_hash() {
                    warn!(path = %path.display(), "file changed during the build");
                }
                self.parse(&content, path, read_hash)?
            }
        };
        Ok(Arc::clone(file.attach_data(data)))
    }
}

fn read(path: &Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeaderScanner;
    use circa_cache::CompileCacheEntry;
    use circa_common::{CompileFlags, SourceName};
    use circa_diagnostics::{Diagnostic, Location};
    use std::path::PathBuf;

    /// Delegates to the header scanner and counts invocations.
    #[derive(Default)]
    struct CountingGrammar {
        parses: AtomicUsize,
        template_calls: AtomicUsize,
    }

    impl GrammarParser for CountingGrammar {
        fn parse(
            &self,
            content: &str,
            path: &Path,
        ) -> Result<ResolvedFileData, Vec<Diagnostic>> {
            self.parses.fetch_add(1, Ordering::SeqCst);
            HeaderScanner.parse(content, path)
        }

        fn template_inputs(
            &self,
            content: &str,
            path: &Path,
            template: &str,
            parameter_values: &[i64],
        ) -> Result<Vec<SignalInfo>, Vec<Diagnostic>> {
            self.template_calls.fetch_add(1, Ordering::SeqCst);
            HeaderScanner.template_inputs(content, path, template, parameter_values)
        }
    }

    const SRC: &str = "include \"lib.circom\";\ntemplate T(n) { signal input x[n]; }\n";

    fn hash(s: &str) -> ContentHash {
        ContentHash::from_bytes(s.as_bytes())
    }

    #[test]
    fn same_hash_returns_same_arc_without_reparse() {
        let grammar = CountingGrammar::default();
        let cache = CompileCache::new();
        let parser = FileParser::new(&grammar, &cache);

        let first = parser.parse(SRC, Path::new("/p/a.circom"), hash(SRC)).unwrap();
        let second = parser.parse(SRC, Path::new("/p/b.circom"), hash(SRC)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(grammar.parses.load(Ordering::SeqCst), 1);
        assert_eq!(
            parser.stats(),
            ParserStats {
                memory_hits: 1,
                cache_hits: 0,
                grammar_runs: 1
            }
        );
    }

    #[test]
    fn durable_cache_hit_skips_grammar() {
        let mut cache = CompileCache::new();
        let cached = ResolvedFileData {
            includes: vec!["from-cache.circom".to_string()],
            ..ResolvedFileData::default()
        };
        cache.add_file(CompileCacheEntry {
            last_modification_ms: 1,
            content_hash: hash(SRC),
            source_name: SourceName::new("a.circom"),
            absolute_path: PathBuf::from("/p/a.circom"),
            compile_flags: CompileFlags::default(),
            resolved_data: cached.clone(),
        });
        let grammar = CountingGrammar::default();
        let parser = FileParser::new(&grammar, &cache);

        let data = parser.parse(SRC, Path::new("/p/a.circom"), hash(SRC)).unwrap();
        assert_eq!(*data, cached);
        assert_eq!(grammar.parses.load(Ordering::SeqCst), 0);
        assert_eq!(parser.stats().cache_hits, 1);

        let again = parser.parse(SRC, Path::new("/p/a.circom"), hash(SRC)).unwrap();
        assert!(Arc::ptr_eq(&data, &again));
        assert_eq!(parser.stats().memory_hits, 1);
    }

    #[test]
    fn stale_durable_entry_is_ignored() {
        let mut cache = CompileCache::new();
        cache.add_file(CompileCacheEntry {
            last_modification_ms: 1,
            content_hash: hash("old content"),
            source_name: SourceName::new("a.circom"),
            absolute_path: PathBuf::from("/p/a.circom"),
            compile_flags: CompileFlags::default(),
            resolved_data: ResolvedFileData::default(),
        });
        let grammar = CountingGrammar::default();
        let parser = FileParser::new(&grammar, &cache);

        let data = parser.parse(SRC, Path::new("/p/a.circom"), hash(SRC)).unwrap();
        assert_eq!(data.includes, vec!["lib.circom"]);
        assert_eq!(grammar.parses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn syntax_errors_carry_all_diagnostics() {
        let grammar = CountingGrammar::default();
        let cache = CompileCache::new();
        let parser = FileParser::new(&grammar, &cache);
        let src = "include a;\ninclude b;\n";
        let err = parser.parse(src, Path::new("/p/bad.circom"), hash(src)).unwrap_err();
        match err {
            ParseError::Syntax { path, diagnostics } => {
                assert_eq!(path, PathBuf::from("/p/bad.circom"));
                assert_eq!(diagnostics.len(), 2);
                assert_eq!(diagnostics[1].location, Some(Location::new(2, 9)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_file_reads_once_and_attaches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.circom");
        std::fs::write(&path, SRC).unwrap();
        let file = ResolvedFile::new(SourceName::new("a.circom"), path.clone(), 0, hash(SRC), None);

        let grammar = CountingGrammar::default();
        let cache = CompileCache::new();
        let parser = FileParser::new(&grammar, &cache);
        let data = parser.parse_file(&file).unwrap();
        assert!(Arc::ptr_eq(&data, file.data().unwrap()));

        std::fs::remove_file(&path).unwrap();
        let again = parser.parse_file(&file).unwrap();
        assert!(Arc::ptr_eq(&data, &again));
        assert_eq!(grammar.parses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn parse_file_keys_result_by_bytes_read() {
        const OLD: &str = "template Old() {}\n";
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.circom");
        std::fs::write(&path, SRC).unwrap();
        // Fingerprinted before the last write.
        let file = ResolvedFile::new(SourceName::new("a.circom"), path.clone(), 0, hash(OLD), None);

        let grammar = CountingGrammar::default();
        let cache = CompileCache::new();
        let parser = FileParser::new(&grammar, &cache);
        let data = parser.parse_file(&file).unwrap();
        assert_eq!(data.includes, vec!["lib.circom"]);

        let by_current = parser.parse(SRC, Path::new("/p/b.circom"), hash(SRC)).unwrap();
        assert!(Arc::ptr_eq(&data, &by_current));
        let by_stale = parser.parse(OLD, Path::new("/p/c.circom"), hash(OLD)).unwrap();
        assert!(by_stale.includes.is_empty());
        assert!(by_stale.templates.contains_key("Old"));
        assert_eq!(grammar.parses.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn parse_file_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.circom");
        let file = ResolvedFile::new(SourceName::new("gone.circom"), path, 0, hash("x"), None);
        let grammar = CountingGrammar::default();
        let cache = CompileCache::new();
        let parser = FileParser::new(&grammar, &cache);
        assert!(matches!(
            parser.parse_file(&file),
            Err(ParseError::Io { .. })
        ));
    }

    #[test]
    fn template_inputs_never_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.circom");
        std::fs::write(&path, SRC).unwrap();
        let grammar = CountingGrammar::default();
        let cache = CompileCache::new();
        let parser = FileParser::new(&grammar, &cache);

        let four = parser.parse_template_inputs(&path, "T", &[4]).unwrap();
        let seven = parser.parse_template_inputs(&path, "T", &[7]).unwrap();
        assert_eq!(four[0].dimensions, vec![4]);
        assert_eq!(seven[0].dimensions, vec![7]);
        assert_eq!(grammar.template_calls.load(Ordering::SeqCst), 2);
        assert_eq!(grammar.parses.load(Ordering::SeqCst), 1);

        assert!(matches!(
            parser.parse_template_inputs(&path, "Nope", &[]),
            Err(ParseError::UnknownTemplate { .. })
        ));
    }
}
