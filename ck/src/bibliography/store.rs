//! In-memory bibliography with fuzzy search

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config as MatcherConfig, Matcher, Utf32Str};
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::entry::CitationEntry;
use super::error::BibliographyError;

/// Maximum results returned by a search unless the caller asks otherwise
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Environment variable overriding the bibliography location
pub const BIB_JSON_ENV: &str = "BIB_JSON";

/// Resolve the bibliography path: explicit > `BIB_JSON` > `~/endnote/phd_biblio.json`
pub fn resolve_path(explicit: Option<PathBuf>, env_value: Option<OsString>, home: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return PathBuf::from(value);
    }
    home.unwrap_or_else(|| PathBuf::from("."))
        .join("endnote")
        .join("phd_biblio.json")
}

/// An entry paired with the flattened text it is matched against
#[derive(Debug, Clone)]
pub struct SearchIndexEntry {
    pub entry: CitationEntry,
    pub search_text: String,
}

impl SearchIndexEntry {
    fn new(entry: CitationEntry) -> Self {
        let search_text = entry.search_text();
        Self { entry, search_text }
    }
}

/// A CSL-JSON bibliography loaded into memory
#[derive(Debug, Clone)]
pub struct Bibliography {
    path: PathBuf,
    index: Vec<SearchIndexEntry>,
    min_score: Option<u32>,
}

impl Bibliography {
    /// Create an empty bibliography bound to a path; nothing is read until [`Bibliography::load`]
    pub fn new(path: Option<PathBuf>) -> Self {
        let path = resolve_path(path, std::env::var_os(BIB_JSON_ENV), dirs::home_dir());
        debug!(path = %path.display(), "Bibliography::new: called");
        Self {
            path,
            index: Vec::new(),
            min_score: None,
        }
    }

    /// Create a bibliography from entries already in memory
    pub fn with_entries(path: impl Into<PathBuf>, entries: Vec<CitationEntry>) -> Self {
        Self {
            path: path.into(),
            index: entries.into_iter().map(SearchIndexEntry::new).collect(),
            min_score: None,
        }
    }

    /// Drop matches scoring below `min_score`; `None` keeps every match
    pub fn with_min_score(mut self, min_score: Option<u32>) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn min_score(&self) -> Option<u32> {
        self.min_score
    }

    /// Number of loaded entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Entries in load order
    pub fn entries(&self) -> impl Iterator<Item = &CitationEntry> {
        self.index.iter().map(|item| &item.entry)
    }

    /// Load (or reload) the bibliography file
    ///
    /// A missing file yields an empty bibliography. A file that exists but
    /// cannot be read or parsed is an error, and the previously loaded
    /// entries are kept.
    pub async fn load(&mut self) -> Result<(), BibliographyError> {
        debug!(path = %self.path.display(), "Bibliography::load: called");

        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|source| BibliographyError::Read {
                path: self.path.clone(),
                source,
            })?;
        if !exists {
            info!(path = %self.path.display(), "No bibliography found, starting empty");
            self.index = Vec::new();
            return Ok(());
        }

        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| BibliographyError::Read {
                path: self.path.clone(),
                source,
            })?;
        let data: Value = serde_json::from_str(&raw).map_err(|source| BibliographyError::Parse {
            path: self.path.clone(),
            source,
        })?;

        self.index = extract_entries(data).into_iter().map(SearchIndexEntry::new).collect();
        info!(path = %self.path.display(), entries = self.index.len(), "Loaded bibliography");
        Ok(())
    }

    /// Fuzzy search over year, author surnames, title and key
    ///
    /// An empty query returns the first `limit` entries in load order.
    /// Otherwise matches come back best first, equal scores in load order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&CitationEntry> {
        debug!(%query, limit, "Bibliography::search: called");
        if self.index.is_empty() || limit == 0 {
            return Vec::new();
        }
        if query.is_empty() {
            return self.entries().take(limit).collect();
        }

        let pattern = Pattern::new(query, CaseMatching::Ignore, Normalization::Smart, AtomKind::Fuzzy);
        let mut matcher = Matcher::new(MatcherConfig::DEFAULT);
        let mut buf = Vec::new();

        let mut scored: Vec<(u32, &CitationEntry)> = self
            .index
            .iter()
            .filter_map(|item| {
                let score = pattern.score(Utf32Str::new(&item.search_text, &mut buf), &mut matcher)?;
                match self.min_score {
                    Some(min) if score < min => None,
                    _ => Some((score, &item.entry)),
                }
            })
            .collect();

        // sort_by is stable, so ties stay in load order
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(limit);
        debug!(matches = scored.len(), "Bibliography::search: ranked");

        scored.into_iter().map(|(_, entry)| entry).collect()
    }
}

fn extract_entries(data: Value) -> Vec<CitationEntry> {
    let items = match data {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            let entry = CitationEntry::from_value(item);
            if entry.is_opaque() {
                warn!(position, "Bibliography item is not an object, keeping it with empty fields");
            }
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn write_json(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    fn corpus() -> Value {
        json!([
            {
                "id": "davidson:1963",
                "type": "article-journal",
                "title": "Actions, Reasons, and Causes",
                "author": [{"family": "Davidson", "given": "Donald"}],
                "issued": {"date-parts": [[1963]]}
            },
            {
                "id": "butterfill:2015_gilbert",
                "type": "chapter",
                "title": "Planning for Collective Agency",
                "author": [{"family": "Butterfill", "given": "Stephen"}],
                "issued": {"date-parts": [[2015]]}
            },
            {
                "id": "apperly:2009_do",
                "type": "article-journal",
                "title": "Do humans have two systems to track beliefs and belief-like states?",
                "author": [{"family": "Apperly"}, {"family": "Butterfill"}],
                "issued": {"date-parts": [["2009"]]}
            },
            {
                "id": "bratman:2014_shared",
                "type": "book",
                "title": "Shared Agency: A Planning Theory of Acting Together",
                "author": [{"family": "Bratman", "given": "Michael"}],
                "issued": {"date-parts": [[2014]]}
            },
            {
                "id": "gilbert:1990_walking",
                "type": "article-journal",
                "title": "Walking Together: A Paradigmatic Social Phenomenon",
                "author": "Gilbert, Margaret",
                "issued": {"date-parts": []}
            }
        ])
    }

    #[test]
    fn test_resolve_path_priority() {
        let home = Some(PathBuf::from("/home/someone"));

        assert_eq!(
            resolve_path(Some(PathBuf::from("/explicit.json")), Some("/env.json".into()), home.clone()),
            PathBuf::from("/explicit.json")
        );
        assert_eq!(
            resolve_path(None, Some("/env.json".into()), home.clone()),
            PathBuf::from("/env.json")
        );
        assert_eq!(
            resolve_path(None, None, home.clone()),
            PathBuf::from("/home/someone/endnote/phd_biblio.json")
        );
        assert_eq!(
            resolve_path(None, Some(OsString::new()), home),
            PathBuf::from("/home/someone/endnote/phd_biblio.json")
        );
    }

    #[test]
    fn test_search_before_load_is_empty() {
        let bib = Bibliography::new(Some(PathBuf::from("/never/read.json")));
        assert_eq!(bib.len(), 0);
        assert!(bib.search("Async", DEFAULT_SEARCH_LIMIT).is_empty());
        assert!(bib.search("", DEFAULT_SEARCH_LIMIT).is_empty());
    }

    #[tokio::test]
    async fn test_load_items_wrapper_and_search() {
        let temp = TempDir::new().unwrap();
        let path = write_json(
            &temp,
            "bib.json",
            &json!({"items": [{"id": "test:1", "title": "Async Title", "type": "article"}]}),
        );

        let mut bib = Bibliography::new(Some(path));
        bib.load().await.unwrap();

        assert_eq!(bib.len(), 1);
        let results = bib.search("Async", DEFAULT_SEARCH_LIMIT);
        assert_eq!(results[0].id, "test:1");
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let mut bib = Bibliography::new(Some(PathBuf::from("/non/existent/path.json")));
        bib.load().await.unwrap();
        assert_eq!(bib.len(), 0);
        assert!(bib.is_empty());
    }

    #[tokio::test]
    async fn test_load_invalid_json_errors_every_time() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, "{ \"broken\": ... ").unwrap();

        let mut bib = Bibliography::new(Some(path));
        for _ in 0..3 {
            let err = bib.load().await.unwrap_err();
            assert!(err.is_parse(), "expected parse error, got {err}");
        }
        assert_eq!(bib.len(), 0);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_entries() {
        let temp = TempDir::new().unwrap();
        let path = write_json(&temp, "bib.json", &corpus());

        let mut bib = Bibliography::new(Some(path.clone()));
        bib.load().await.unwrap();
        assert_eq!(bib.len(), 5);

        fs::write(&path, "not json").unwrap();
        assert!(bib.load().await.is_err());
        assert_eq!(bib.len(), 5);
    }

    #[tokio::test]
    async fn test_load_directory_is_read_error() {
        let temp = TempDir::new().unwrap();
        let mut bib = Bibliography::new(Some(temp.path().to_path_buf()));

        let err = bib.load().await.unwrap_err();
        assert!(matches!(err, BibliographyError::Read { .. }));
    }

    #[tokio::test]
    async fn test_load_unrecognized_shapes_are_empty() {
        let temp = TempDir::new().unwrap();
        for (name, value) in [
            ("object.json", json!({"entries": [{"id": "a"}]})),
            ("items_object.json", json!({"items": {"id": "a"}})),
            ("string.json", json!("hello")),
            ("null.json", json!(null)),
        ] {
            let mut bib = Bibliography::new(Some(write_json(&temp, name, &value)));
            bib.load().await.unwrap();
            assert_eq!(bib.len(), 0, "{name}");
        }
    }

    #[tokio::test]
    async fn test_load_keeps_non_object_items() {
        let temp = TempDir::new().unwrap();
        let raw = json!([{"id": "a", "type": "book"}, 7, "x", {"id": "b", "type": "book"}]);
        let path = write_json(&temp, "mixed.json", &raw);

        let mut bib = Bibliography::new(Some(path));
        bib.load().await.unwrap();
        assert_eq!(bib.len(), 4);

        let first: Vec<_> = bib.search("", 3).into_iter().cloned().collect();
        let ids: Vec<_> = first.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "", ""]);
        assert!(first[1].is_opaque());

        let written = serde_json::to_value(bib.search("", 10)).unwrap();
        assert_eq!(written, raw);

        let ids: Vec<_> = bib.search("b", 10).iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_kept() {
        let temp = TempDir::new().unwrap();
        let path = write_json(&temp, "dup.json", &json!([{"id": "same", "title": "One"}, {"id": "same", "title": "Two"}]));

        let mut bib = Bibliography::new(Some(path));
        bib.load().await.unwrap();
        assert_eq!(bib.len(), 2);
    }

    #[tokio::test]
    async fn test_search_corpus_cases() {
        let temp = TempDir::new().unwrap();
        let mut bib = Bibliography::new(Some(write_json(&temp, "corpus.json", &corpus())));
        bib.load().await.unwrap();

        let cases = [
            ("davidson 1963", "davidson:1963"),
            ("Davidson", "davidson:1963"),
            ("butterfill 2015", "butterfill:2015_gilbert"),
            ("apperly butterfill", "apperly:2009_do"),
            ("2009 belief", "apperly:2009_do"),
            ("shared agency", "bratman:2014_shared"),
            ("walking together", "gilbert:1990_walking"),
            ("gilbert:1990_walking", "gilbert:1990_walking"),
        ];
        for (query, expected) in cases {
            let ids: Vec<_> = bib.search(query, 5).iter().map(|e| e.id.clone()).collect();
            assert!(ids.contains(&expected.to_string()), "query '{query}' expected '{expected}', got {ids:?}");
        }

        let first = bib.search("davidson 1963", DEFAULT_SEARCH_LIMIT)[0];
        assert_eq!(first.id, "davidson:1963");
    }

    #[test]
    fn test_empty_query_returns_load_order() {
        let entries: Vec<CitationEntry> = (0..30).map(|i| CitationEntry::new(format!("k:{i}"), "book")).collect();
        let bib = Bibliography::with_entries("/mem.json", entries);

        let ids: Vec<_> = bib.search("", DEFAULT_SEARCH_LIMIT).iter().map(|e| e.id.clone()).collect();
        let expected: Vec<_> = (0..20).map(|i| format!("k:{i}")).collect();
        assert_eq!(ids, expected);

        assert_eq!(bib.search("", 3).len(), 3);
        assert!(bib.search("k", 0).is_empty());
    }

    #[test]
    fn test_ties_keep_load_order() {
        let second = CitationEntry::new("zz:2", "book").with_title("Same Title");
        let first = CitationEntry::new("aa:1", "book").with_title("Same Title");

        let bib = Bibliography::with_entries("/mem.json", vec![second, first]);
        let ids: Vec<_> = bib.search("same title", 10).iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec!["zz:2", "aa:1"]);
    }

    #[test]
    fn test_non_matching_entries_are_excluded() {
        let e = CitationEntry::new("x:1", "book").with_title("Bayesian Models");
        let bib = Bibliography::with_entries("/mem.json", vec![e]);

        assert!(bib.search("qqqq", 10).is_empty());
    }

    #[test]
    fn test_no_threshold_by_default() {
        let strong = CitationEntry::new("strong:1", "book").with_title("Joint Action");
        let weak = CitationEntry::new("w:2", "book").with_title("J o i n t scattered a c t i o n");
        let bib = Bibliography::with_entries("/mem.json", vec![weak, strong]);

        assert_eq!(bib.min_score(), None);
        let ids: Vec<_> = bib.search("jointaction", 10).iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], "strong:1");

        let strict = bib.clone().with_min_score(Some(u32::MAX));
        assert!(strict.search("jointaction", 10).is_empty());
    }

    proptest! {
        #[test]
        fn prop_search_by_id_finds_entry(
            ids in prop::collection::btree_set("[a-z]{2,8}:[0-9]{1,4}", 1..20),
            title in "[A-Za-z ]{0,24}",
        ) {
            let ids: BTreeSet<String> = ids;
            let entries: Vec<CitationEntry> = ids
                .iter()
                .map(|id| CitationEntry::new(id.clone(), "article").with_title(title.clone()))
                .collect();
            let n = entries.len();
            let bib = Bibliography::with_entries("/mem.json", entries);

            for id in &ids {
                let results = bib.search(id, n);
                prop_assert!(results.iter().any(|e| &e.id == id), "id {} not found", id);
            }
        }

        #[test]
        fn prop_empty_query_is_prefix(count in 0usize..40, limit in 1usize..30) {
            let entries: Vec<CitationEntry> = (0..count).map(|i| CitationEntry::new(format!("k{i}"), "book")).collect();
            let bib = Bibliography::with_entries("/mem.json", entries.clone());

            let got: Vec<CitationEntry> = bib.search("", limit).into_iter().cloned().collect();
            let expected: Vec<CitationEntry> = entries.into_iter().take(limit).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
