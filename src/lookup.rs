// ABOUTME: Passage lookup for the bibslide application
// ABOUTME: Queries the Bible SuperSearch API and guards against stale responses

use crate::content::{BibleContent, Verse};
use log::{debug, info, warn};
use reqwest::blocking::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_LOOKUP_URL: &str = "https://api.biblesupersearch.com/api";
pub const DEFAULT_TRANSLATION: &str = "hcv";

/// Search results beyond this count are dropped
const MAX_SEARCH_RESULTS: usize = 10;

// Three-letter prefixes of the book names the API accepts
const BOOK_PREFIXES: &[&str] = &[
    "gen", "exo", "lev", "num", "deu", "jos", "jdg", "rut", "1sa", "2sa", "1ki", "2ki", "1ch",
    "2ch", "ezr", "neh", "est", "job", "psa", "pro", "ecc", "sng", "isa", "jer", "lam", "ezk",
    "dan", "hos", "jol", "amo", "oba", "jon", "mic", "nam", "hab", "zep", "hag", "zec", "mal",
    "mat", "mar", "luk", "joh", "act", "rom", "1co", "2co", "gal", "eph", "phi", "col", "1th",
    "2th", "1ti", "2ti", "tit", "phm", "heb", "jam", "1pe", "2pe", "1jo", "2jo", "3jo", "jud",
    "rev",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("No passage found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Lookup service is unreachable")]
    Offline,
}

/// Source of Bible passages
pub trait PassageLookup {
    fn fetch(&self, query: &str, translation: &str) -> Result<BibleContent, LookupError>;
}

/// How a free-form query is sent to the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupQuery {
    /// "John 3:16-18", "Rom 1:1-2; Matt 5:6-8" or a bare book name
    Reference(String),
    /// "Romans faith": keyword search restricted to a book
    BookSearch { book: String, terms: String },
    /// Keyword search over the whole Bible
    Search(String),
}

impl LookupQuery {
    pub fn classify(query: &str) -> Self {
        let query = query.trim();
        if query.chars().any(|c| c.is_ascii_digit() || c == ':' || c == ';') {
            return LookupQuery::Reference(query.to_string());
        }

        let parts: Vec<&str> = query.split_whitespace().collect();
        let first = parts.first().copied().unwrap_or_default();
        let lower = first.to_lowercase();
        let is_book = BOOK_PREFIXES.iter().any(|b| lower.starts_with(b)) || first.len() > 15;

        match (is_book, parts.len()) {
            (true, 1) => LookupQuery::Reference(query.to_string()),
            (true, n) if n > 1 => LookupQuery::BookSearch {
                book: first.to_string(),
                terms: parts[1..].join(" "),
            },
            _ => LookupQuery::Search(query.to_string()),
        }
    }

    fn append_to(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        match self {
            LookupQuery::Reference(reference) => {
                pairs.append_pair("reference", reference);
            }
            LookupQuery::BookSearch { book, terms } => {
                pairs.append_pair("reference", book);
                pairs.append_pair("search", terms);
            }
            LookupQuery::Search(terms) => {
                pairs.append_pair("search", terms);
            }
        }
    }
}

/// Configuration for the HTTP lookup client
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub retries: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LOOKUP_URL.to_string(),
            timeout_ms: 10000,
            retries: 3,
        }
    }
}

/// Blocking client for the Bible SuperSearch API
pub struct SuperSearchClient {
    config: LookupConfig,
    client: Client,
}

impl SuperSearchClient {
    pub fn new(config: LookupConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Full request URL for a query
    pub fn request_url(&self, query: &str, translation: &str) -> Result<Url, LookupError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| LookupError::Network(format!("Invalid lookup URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("bible", &translation.to_lowercase());
        LookupQuery::classify(query).append_to(&mut url);
        Ok(url)
    }

    fn get_json(&self, url: &Url) -> Result<Value, LookupError> {
        let mut retry_delay = 500;
        let mut last_error = LookupError::Offline;
        let attempts = self.config.retries.max(1);

        for attempt in 1..=attempts {
            match self.client.get(url.clone()).send() {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<Value>()
                        .map_err(|e| LookupError::Network(format!("Invalid response: {}", e)));
                }
                Ok(response) if response.status().is_client_error() => {
                    return Err(LookupError::Network(format!("HTTP error: {}", response.status())));
                }
                Ok(response) => {
                    last_error = LookupError::Network(format!("HTTP error: {}", response.status()));
                }
                Err(e) if e.is_connect() => last_error = LookupError::Offline,
                Err(e) => last_error = LookupError::Network(e.to_string()),
            }

            if attempt < attempts {
                warn!(
                    "Lookup attempt {} failed ({}), retrying in {} ms",
                    attempt, last_error, retry_delay
                );
                std::thread::sleep(Duration::from_millis(retry_delay));
                retry_delay *= 2;
            }
        }

        Err(last_error)
    }
}

impl PassageLookup for SuperSearchClient {
    fn fetch(&self, query: &str, translation: &str) -> Result<BibleContent, LookupError> {
        if query.trim().is_empty() {
            return Err(LookupError::NotFound("Empty query".to_string()));
        }
        let url = self.request_url(query, translation)?;
        info!("Looking up passage: {}", url);
        let body = self.get_json(&url)?;
        parse_response(&body, translation)
    }
}

fn parse_number(key: &str) -> u32 {
    key.trim().parse().unwrap_or_default()
}

/// Numeric keys sorted numerically, not lexically
fn numeric_entries(map: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by_key(|(key, _)| parse_number(key));
    entries
}

/// Convert an API response body into Bible content
pub fn parse_response(body: &Value, translation: &str) -> Result<BibleContent, LookupError> {
    if let Some(first) = body
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        let message = first
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| first.to_string());
        return Err(LookupError::NotFound(message));
    }

    let results = body
        .get("results")
        .ok_or_else(|| LookupError::NotFound("No results found".to_string()))?;

    let (book, chapter, mut verses) =
        if let Some(by_translation) = results.get("verses").and_then(Value::as_object) {
            parse_reference_results(by_translation)?
        } else if let Some(hits) = results
            .get("search")
            .and_then(|s| s.get("results"))
            .and_then(Value::as_array)
        {
            parse_search_results(hits)?
        } else {
            return Err(LookupError::NotFound("No results found".to_string()));
        };

    if verses.is_empty() {
        return Err(LookupError::NotFound(
            "No verses found in the response".to_string(),
        ));
    }
    verses.sort_by_key(|v| v.number);
    debug!("Lookup returned {} verses for {}", verses.len(), book);

    Ok(BibleContent {
        book,
        chapter,
        verses,
        translation: Some(translation.to_lowercase()),
    })
}

fn verse_text(value: &Value) -> String {
    value
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn parse_reference_results(
    by_translation: &Map<String, Value>,
) -> Result<(String, u32, Vec<Verse>), LookupError> {
    let books = by_translation
        .values()
        .next()
        .and_then(Value::as_object)
        .ok_or_else(|| LookupError::NotFound("Translation not found in results".to_string()))?;

    let multiple_books = books.len() > 1;
    let mut book_name = if multiple_books {
        "Multiple Books".to_string()
    } else {
        books.keys().next().cloned().unwrap_or_default()
    };
    let mut chapter_number = 0;
    let mut verses = Vec::new();

    for (book, chapters) in books {
        let Some(chapters) = chapters.as_object() else {
            continue;
        };
        let multiple_chapters = chapters.len() > 1;
        if !multiple_books {
            if multiple_chapters {
                book_name = format!("{} (Multiple Chapters)", book);
            } else if let Some(key) = chapters.keys().next() {
                chapter_number = parse_number(key);
            }
        }

        for (chapter, chapter_verses) in numeric_entries(chapters) {
            let Some(chapter_verses) = chapter_verses.as_object() else {
                continue;
            };
            for (verse, data) in numeric_entries(chapter_verses) {
                let text = if multiple_books || multiple_chapters {
                    format!("[{} {}:{}] {}", book, chapter, verse, verse_text(data))
                } else {
                    verse_text(data)
                };
                verses.push(Verse {
                    number: parse_number(verse),
                    text,
                });
            }
        }
    }

    Ok((book_name, chapter_number, verses))
}

fn parse_search_results(hits: &[Value]) -> Result<(String, u32, Vec<Verse>), LookupError> {
    if hits.is_empty() {
        return Err(LookupError::NotFound("No search results found".to_string()));
    }

    let field = |hit: &Value, name: &str| -> String {
        match hit.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    };

    let verses = hits
        .iter()
        .take(MAX_SEARCH_RESULTS)
        .map(|hit| {
            let verse = field(hit, "verse");
            Verse {
                number: parse_number(&verse),
                text: format!(
                    "[{} {}:{}] {}",
                    field(hit, "book"),
                    field(hit, "chapter"),
                    verse,
                    field(hit, "text")
                ),
            }
        })
        .collect();

    Ok(("Search Results".to_string(), 0, verses))
}

/// Identifies one in-flight lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTicket(u64);

/// Hands out tickets and tells whether a response is still wanted.
///
/// Only the response for the most recently issued ticket is current.
#[derive(Debug, Default)]
pub struct LookupTracker {
    latest: u64,
}

impl LookupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> LookupTicket {
        self.latest += 1;
        LookupTicket(self.latest)
    }

    pub fn is_current(&self, ticket: LookupTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Invalidate every outstanding ticket
    pub fn cancel(&mut self) {
        self.latest += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_references() {
        assert_eq!(
            LookupQuery::classify(" John 3:16-18 "),
            LookupQuery::Reference("John 3:16-18".to_string())
        );
        assert_eq!(
            LookupQuery::classify("Rom"),
            LookupQuery::Reference("Rom".to_string())
        );
    }

    #[test]
    fn test_classify_searches() {
        assert_eq!(
            LookupQuery::classify("Romans faith hope"),
            LookupQuery::BookSearch {
                book: "Romans".to_string(),
                terms: "faith hope".to_string()
            }
        );
        assert_eq!(
            LookupQuery::classify("faith"),
            LookupQuery::Search("faith".to_string())
        );
    }

    #[test]
    fn test_request_url() {
        let client = SuperSearchClient::new(LookupConfig::default()).unwrap();
        let url = client.request_url("John 3:16", "KJV").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.biblesupersearch.com/api?bible=kjv&reference=John+3%3A16"
        );
    }

    #[test]
    fn test_parse_reference_response_sorts_numerically() {
        let body = json!({
            "errors": [],
            "results": { "verses": { "kjv": { "John": { "3": {
                "10": { "text": "ten" },
                "2": { "text": "two" },
                "9": { "text": "nine" }
            }}}}}
        });
        let content = parse_response(&body, "KJV").unwrap();
        assert_eq!(content.book, "John");
        assert_eq!(content.chapter, 3);
        let numbers: Vec<u32> = content.verses.iter().map(|v| v.number).collect();
        assert_eq!(numbers, vec![2, 9, 10]);
        assert_eq!(content.verses[0].text, "two");
        assert_eq!(content.translation.as_deref(), Some("kjv"));
    }

    #[test]
    fn test_parse_multiple_chapters_prefixes_references() {
        let body = json!({
            "results": { "verses": { "kjv": { "John": {
                "3": { "36": { "text": "end" } },
                "4": { "1": { "text": "start" } }
            }}}}
        });
        let content = parse_response(&body, "kjv").unwrap();
        assert_eq!(content.book, "John (Multiple Chapters)");
        assert_eq!(content.chapter, 0);
        assert!(content.verses.iter().any(|v| v.text == "[John 4:1] start"));
    }

    #[test]
    fn test_parse_search_response() {
        let body = json!({
            "results": { "search": { "results": [
                { "book": "Romans", "chapter": 5, "verse": 1, "text": "faith" }
            ]}}
        });
        let content = parse_response(&body, "kjv").unwrap();
        assert_eq!(content.book, "Search Results");
        assert_eq!(content.verses[0].text, "[Romans 5:1] faith");
    }

    #[test]
    fn test_api_errors_are_not_found() {
        let body = json!({ "errors": ["Book not found"] });
        assert_eq!(
            parse_response(&body, "kjv"),
            Err(LookupError::NotFound("Book not found".to_string()))
        );
        let empty = json!({ "results": { "search": { "results": [] } } });
        assert!(matches!(
            parse_response(&empty, "kjv"),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn test_only_latest_ticket_is_current() {
        let mut tracker = LookupTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        tracker.cancel();
        assert!(!tracker.is_current(second));
    }
}
