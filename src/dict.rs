//! The word dictionary: wire format, remote fetch, and search.
//!
//! The remote payload carries every language at once, so the store
//! fetches it exactly once per process and every caller shares the
//! same in-flight or completed request. The store is an explicit
//! injected object rather than module state, which keeps the
//! single-fetch invariant visible and testable.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::tokenize::tokenize;

/// Language substituted when a requested language is absent from the
/// fetched payload.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Published dictionary dataset for all languages.
pub const DEFAULT_WORDS_URL: &str = "https://toki.ma/jasima/data.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Modifier,
    Preposition,
    Particle,
    Numeral,
}

impl PartOfSpeech {
    pub const ALL: [PartOfSpeech; 6] = [
        PartOfSpeech::Noun,
        PartOfSpeech::Verb,
        PartOfSpeech::Modifier,
        PartOfSpeech::Preposition,
        PartOfSpeech::Particle,
        PartOfSpeech::Numeral,
    ];

    /// The key this part of speech uses in the wire format and in the
    /// per-language `labels` table.
    pub fn key(self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Modifier => "modifier",
            PartOfSpeech::Preposition => "preposition",
            PartOfSpeech::Particle => "particle",
            PartOfSpeech::Numeral => "numeral",
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single word's definitions across parts of speech plus display
/// metadata, exactly as the remote dataset ships it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordDef {
    pub emoji: String,
    /// Base part of speech.
    pub base: String,
    /// Canonical spelling.
    pub word: String,
    pub etymology: String,
    /// Short gloss shown in search results and popovers.
    pub short: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noun: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preposition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeral: Option<String>,
}

impl WordDef {
    pub fn definition(&self, pos: PartOfSpeech) -> Option<&str> {
        let field = match pos {
            PartOfSpeech::Noun => &self.noun,
            PartOfSpeech::Verb => &self.verb,
            PartOfSpeech::Modifier => &self.modifier,
            PartOfSpeech::Preposition => &self.preposition,
            PartOfSpeech::Particle => &self.particle,
            PartOfSpeech::Numeral => &self.numeral,
        };
        field.as_deref()
    }

    /// Present part-of-speech definitions in a fixed order.
    pub fn definitions(&self) -> impl Iterator<Item = (PartOfSpeech, &str)> {
        PartOfSpeech::ALL
            .into_iter()
            .filter_map(|pos| self.definition(pos).map(|text| (pos, text)))
    }

    /// Bidirectional match: the toki ma word itself, the short gloss,
    /// or any definition text. `exact` switches from substring to
    /// whole-word matching.
    pub fn matches(&self, query: &str, exact: bool) -> bool {
        let query = query.to_lowercase();
        if query.is_empty() {
            return false;
        }
        let mut texts = std::iter::once(self.short.as_str())
            .chain(self.definitions().map(|(_, text)| text));
        if exact {
            self.word.to_lowercase() == query
                || texts
                    .flat_map(tokenize)
                    .any(|t| t.is_word && t.text.eq_ignore_ascii_case(&query))
        } else {
            self.word.to_lowercase().contains(&query)
                || texts.any(|text| text.to_lowercase().contains(&query))
        }
    }
}

/// One language's slice of the dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordList {
    /// Part-of-speech key to display label.
    pub labels: BTreeMap<String, String>,
    /// Lowercase word to entry.
    pub words: BTreeMap<String, WordDef>,
}

impl WordList {
    /// Case-insensitive lookup of a clicked token.
    pub fn lookup(&self, token: &str) -> Option<&WordDef> {
        self.words.get(&token.to_lowercase())
    }

    /// Entries matching `query`, in dictionary order.
    pub fn search(&self, query: &str, exact: bool) -> Vec<&WordDef> {
        self.words
            .values()
            .filter(|def| def.matches(query, exact))
            .collect()
    }

    pub fn label_for(&self, pos: PartOfSpeech) -> &str {
        self.labels
            .get(pos.key())
            .map(String::as_str)
            .unwrap_or_else(|| pos.key())
    }
}

/// Whole remote payload: language name to word list.
pub type WordListResponse = BTreeMap<String, WordList>;

/// A word list together with which language actually backs it, so a
/// silent fallback to [`DEFAULT_LANGUAGE`] stays visible to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedWordList {
    pub requested: String,
    pub resolved: String,
    pub list: WordList,
}

impl ResolvedWordList {
    pub fn fell_back(&self) -> bool {
        self.requested != self.resolved
    }
}

#[derive(Debug)]
pub enum DictError {
    /// Transport or JSON decoding failure.
    Http(reqwest::Error),
    /// Non-success HTTP status from the dictionary endpoint.
    Status(reqwest::StatusCode),
    /// The payload is missing the default language entirely.
    MissingDefault,
}

impl fmt::Display for DictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictError::Http(err) => write!(f, "dictionary fetch failed: {err}"),
            DictError::Status(status) => {
                write!(f, "dictionary endpoint returned HTTP {status}")
            }
            DictError::MissingDefault => {
                write!(f, "dictionary payload has no {DEFAULT_LANGUAGE:?} word list")
            }
        }
    }
}

impl std::error::Error for DictError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DictError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DictError {
    fn from(value: reqwest::Error) -> Self {
        DictError::Http(value)
    }
}

/// Where the payload comes from. Production uses [`HttpSource`];
/// tests inject a fixed payload.
pub trait WordSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<WordListResponse, DictError>> + Send;
}

/// Single GET of the published JSON dataset. No retry, no caching
/// beyond the store's own memoization.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS_URL)
    }
}

impl WordSource for HttpSource {
    fn fetch(&self) -> impl Future<Output = Result<WordListResponse, DictError>> + Send {
        async move {
            debug!(url = %self.url, "fetching word dictionary");
            let response = self.client.get(&self.url).send().await?;
            if !response.status().is_success() {
                return Err(DictError::Status(response.status()));
            }
            Ok(response.json().await?)
        }
    }
}

/// A fixed in-memory payload; used by tests and offline demos.
#[derive(Debug, Clone)]
pub struct StaticSource {
    payload: Arc<WordListResponse>,
}

impl StaticSource {
    pub fn new(payload: WordListResponse) -> Self {
        Self {
            payload: Arc::new(payload),
        }
    }
}

impl WordSource for StaticSource {
    fn fetch(&self) -> impl Future<Output = Result<WordListResponse, DictError>> + Send {
        let payload = self.payload.clone();
        async move { Ok((*payload).clone()) }
    }
}

/// Memoizes one fetch for the life of the process. Concurrent callers
/// share the in-flight request; a later call after a failure retries.
pub struct DictStore<S> {
    source: S,
    cache: OnceCell<Arc<WordListResponse>>,
}

impl<S: WordSource> DictStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: OnceCell::new(),
        }
    }

    /// The full multi-language payload.
    pub async fn full(&self) -> Result<Arc<WordListResponse>, DictError> {
        self.cache
            .get_or_try_init(|| async {
                let payload = self.source.fetch().await?;
                Ok(Arc::new(payload))
            })
            .await
            .map(Arc::clone)
    }

    /// Names of every language the payload carries.
    pub async fn languages(&self) -> Result<Vec<String>, DictError> {
        Ok(self.full().await?.keys().cloned().collect())
    }

    /// The word list for `language`, falling back to
    /// [`DEFAULT_LANGUAGE`] when absent, with the local extension
    /// table merged in (extensions override remote entries).
    pub async fn word_list(&self, language: &str) -> Result<ResolvedWordList, DictError> {
        let full = self.full().await?;
        let (resolved, base) = match full.get(language) {
            Some(list) => (language, list),
            None => {
                let list = full.get(DEFAULT_LANGUAGE).ok_or(DictError::MissingDefault)?;
                (DEFAULT_LANGUAGE, list)
            }
        };
        let mut list = base.clone();
        if let Some(extra) = extension_words(resolved) {
            for (word, def) in extra {
                list.words.insert(word.clone(), def.clone());
            }
        }
        Ok(ResolvedWordList {
            requested: language.to_string(),
            resolved: resolved.to_string(),
            list,
        })
    }
}

/// Community words not yet in the published dataset, merged in after
/// fetch. Currently only English carries extensions.
static EXTENSION_WORDS: Lazy<BTreeMap<&'static str, BTreeMap<String, WordDef>>> = Lazy::new(|| {
    let mut english = BTreeMap::new();
    english.insert(
        "kapesi".to_string(),
        WordDef {
            emoji: "🟫".to_string(),
            base: "modifier".to_string(),
            word: "kapesi".to_string(),
            etymology: "community coinage".to_string(),
            short: "brown, gray".to_string(),
            modifier: Some("brown, gray, drab".to_string()),
            noun: Some("the color brown or gray".to_string()),
            ..WordDef::default()
        },
    );
    english.insert(
        "oke".to_string(),
        WordDef {
            emoji: "👌".to_string(),
            base: "particle".to_string(),
            word: "oke".to_string(),
            etymology: "English \"okay\"".to_string(),
            short: "okay, acknowledged".to_string(),
            particle: Some("okay; acknowledgement or assent".to_string()),
            ..WordDef::default()
        },
    );
    let mut table = BTreeMap::new();
    table.insert(DEFAULT_LANGUAGE, english);
    table
});

fn extension_words(language: &str) -> Option<&'static BTreeMap<String, WordDef>> {
    EXTENSION_WORDS.get(language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    struct CountingSource {
        payload: Arc<WordListResponse>,
        calls: Arc<AtomicUsize>,
    }

    impl CountingSource {
        fn new(payload: WordListResponse) -> Self {
            Self {
                payload: Arc::new(payload),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl WordSource for CountingSource {
        fn fetch(&self) -> impl Future<Output = Result<WordListResponse, DictError>> + Send {
            let payload = self.payload.clone();
            let calls = self.calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok((*payload).clone())
            }
        }
    }

    fn entry(word: &str, short: &str) -> WordDef {
        WordDef {
            word: word.to_string(),
            base: "noun".to_string(),
            short: short.to_string(),
            noun: Some(short.to_string()),
            ..WordDef::default()
        }
    }

    fn english_payload() -> WordListResponse {
        let mut words = BTreeMap::new();
        words.insert("moku".to_string(), entry("moku", "food, to eat"));
        words.insert("kili".to_string(), entry("kili", "fruit, vegetable"));
        let mut labels = BTreeMap::new();
        labels.insert("noun".to_string(), "Noun".to_string());
        let mut payload = BTreeMap::new();
        payload.insert(
            "English".to_string(),
            WordList { labels, words },
        );
        payload
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let source = CountingSource::new(english_payload());
        let calls = source.calls.clone();
        let store = DictStore::new(source);
        let (list, languages) = tokio::join!(store.word_list("English"), store.languages());
        assert!(list.is_ok());
        assert_eq!(languages.unwrap(), vec!["English".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A third call after resolution still reuses the payload.
        store.full().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_language_falls_back_to_default() {
        let store = DictStore::new(StaticSource::new(english_payload()));
        let resolved = store.word_list("Klingon").await.unwrap();
        assert!(resolved.fell_back());
        assert_eq!(resolved.requested, "Klingon");
        assert_eq!(resolved.resolved, "English");
        assert!(resolved.list.lookup("moku").is_some());
    }

    #[tokio::test]
    async fn payload_without_default_language_is_an_error() {
        let mut payload = BTreeMap::new();
        payload.insert("Esperanto".to_string(), WordList::default());
        let store = DictStore::new(StaticSource::new(payload));
        assert!(matches!(
            store.word_list("Klingon").await,
            Err(DictError::MissingDefault)
        ));
    }

    #[tokio::test]
    async fn extension_entries_override_remote_entries() {
        let mut payload = english_payload();
        payload
            .get_mut("English")
            .unwrap()
            .words
            .insert("kapesi".to_string(), entry("kapesi", "stale remote gloss"));
        let store = DictStore::new(StaticSource::new(payload));
        let resolved = store.word_list("English").await.unwrap();
        let def = resolved.list.lookup("kapesi").unwrap();
        assert_eq!(def.short, "brown, gray");
    }

    #[tokio::test]
    async fn extensions_apply_to_the_resolved_language() {
        let store = DictStore::new(StaticSource::new(english_payload()));
        let resolved = store.word_list("Klingon").await.unwrap();
        assert!(resolved.list.lookup("oke").is_some());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut list = WordList::default();
        list.words.insert("moku".to_string(), entry("moku", "food"));
        assert!(list.lookup("Moku").is_some());
        assert!(list.lookup("MOKU").is_some());
        assert!(list.lookup("mokus").is_none());
    }

    #[test]
    fn search_substring_and_exact_modes() {
        let mut list = WordList::default();
        list.words
            .insert("moku".to_string(), entry("moku", "food, to eat"));
        list.words
            .insert("kili".to_string(), entry("kili", "fruit, vegetable"));

        let hits = list.search("mo", false);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].word, "moku");

        let hits = list.search("moku", true);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].word, "moku");

        assert!(list.search("mok", true).is_empty());
    }

    #[test]
    fn search_reaches_definition_text() {
        let mut list = WordList::default();
        list.words
            .insert("kili".to_string(), entry("kili", "fruit, vegetable"));
        let hits = list.search("fruit", true);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].word, "kili");
    }

    #[test]
    fn empty_query_matches_nothing() {
        let mut list = WordList::default();
        list.words.insert("moku".to_string(), entry("moku", "food"));
        assert!(list.search("", false).is_empty());
    }

    #[test]
    fn wire_format_parses_with_sparse_fields() {
        let raw = r#"{
            "English": {
                "labels": { "noun": "Noun", "verb": "Verb" },
                "words": {
                    "moku": {
                        "emoji": "🍽️",
                        "base": "verb",
                        "word": "moku",
                        "etymology": "toki pona \"moku\"",
                        "short": "to eat",
                        "verb": "to eat, to drink, to consume"
                    }
                }
            }
        }"#;
        let payload: WordListResponse = serde_json::from_str(raw).unwrap();
        let def = payload["English"].words["moku"].clone();
        assert_eq!(def.definition(PartOfSpeech::Verb), Some("to eat, to drink, to consume"));
        assert_eq!(def.definition(PartOfSpeech::Noun), None);
        assert_eq!(
            def.definitions().map(|(pos, _)| pos).collect::<Vec<_>>(),
            vec![PartOfSpeech::Verb]
        );
    }
}
