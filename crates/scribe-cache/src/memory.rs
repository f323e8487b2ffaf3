//! In-process cache backend.
//!
//! Mirrors the Redis semantics the cache layer relies on: per-key TTL, glob
//! pattern matching and cursor-based `SCAN`. Used by tests and for local
//! development without a Redis server.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::backend::KeyValueBackend;
use crate::store::CacheError;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Cursors kept for scans that were started but never finished. Beyond
/// this the oldest is dropped and resuming it ends that iteration.
pub const MAX_OPEN_CURSORS: usize = 1024;

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<String, Entry>,
    /// Open cursors, each mapped to the last key it returned. Ids grow
    /// monotonically, so the first entry is the oldest.
    cursors: BTreeMap<u64, String>,
    next_cursor: u64,
    scan_calls: usize,
    unavailable: bool,
}

/// In-memory [`KeyValueBackend`].
///
/// Keys are kept ordered so a scan cursor can resume after the last key it
/// visited. Keys present for the whole iteration are returned exactly once,
/// even when other keys are deleted between rounds.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(state: &State) -> Result<(), CacheError> {
        if state.unavailable {
            return Err(CacheError::Unavailable("memory backend marked unavailable".into()));
        }
        Ok(())
    }

    /// Simulates losing (or regaining) the connection to the store.
    pub fn set_available(&self, available: bool) {
        self.state().unavailable = !available;
    }

    /// Number of `scan` rounds served so far.
    pub fn scan_calls(&self) -> usize {
        self.state().scan_calls
    }

    /// Number of scan cursors still waiting to be resumed.
    pub fn open_cursors(&self) -> usize {
        self.state().cursors.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.state()
            .entries
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let mut state = self.state();
        Self::check_available(&state)?;

        let lookup = state
            .entries
            .get(key)
            .map(|entry| entry.is_live(now).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                state.entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut state = self.state();
        Self::check_available(&state)?;

        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        state
            .entries
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64, CacheError> {
        let now = Instant::now();
        let mut state = self.state();
        Self::check_available(&state)?;

        let mut deleted = 0;
        for key in keys {
            if state.entries.remove(key).is_some_and(|entry| entry.is_live(now)) {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let state = self.state();
        Self::check_available(&state)?;

        Ok(state
            .entries
            .iter()
            .filter(|(key, entry)| entry.is_live(now) && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<String>), CacheError> {
        let now = Instant::now();
        let mut state = self.state();
        Self::check_available(&state)?;
        state.scan_calls += 1;

        let start = if cursor == 0 {
            Bound::Unbounded
        } else {
            match state.cursors.remove(&cursor) {
                Some(last) => Bound::Excluded(last),
                // Unknown cursors end the iteration, like an exhausted Redis cursor.
                None => return Ok((0, Vec::new())),
            }
        };

        let mut matched = Vec::new();
        let mut last_visited = None;
        let mut has_more = false;

        for (visited, (key, entry)) in state
            .entries
            .range::<String, _>((start, Bound::Unbounded))
            .enumerate()
        {
            if visited == count.max(1) {
                has_more = true;
                break;
            }
            if entry.is_live(now) && glob_match(pattern, key) {
                matched.push(key.clone());
            }
            last_visited = Some(key.clone());
        }

        let next_cursor = match last_visited {
            Some(last) if has_more => {
                state.next_cursor += 1;
                let id = state.next_cursor;
                state.cursors.insert(id, last);
                while state.cursors.len() > MAX_OPEN_CURSORS {
                    state.cursors.pop_first();
                }
                id
            }
            _ => 0,
        };

        Ok((next_cursor, matched))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let state = self.state();
        Self::check_available(&state)
    }

    async fn shutdown(&self) -> Result<(), CacheError> {
        let mut state = self.state();
        state.entries.clear();
        state.cursors.clear();
        Ok(())
    }
}

/// Redis-compatible glob matching.
///
/// Supports `*`, `?`, character classes (`[abc]`, `[^abc]`, `[a-z]`) and
/// backslash escapes. An unterminated class matches a literal `[`.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    match_bytes(pattern.as_bytes(), key.as_bytes())
}

fn match_bytes(pattern: &[u8], text: &[u8]) -> bool {
    let Some((&head, rest)) = pattern.split_first() else {
        return text.is_empty();
    };

    match head {
        b'*' => {
            let rest = strip_leading_stars(rest);
            if rest.is_empty() {
                return true;
            }
            (0..=text.len()).any(|i| match_bytes(rest, &text[i..]))
        }
        b'?' => !text.is_empty() && match_bytes(rest, &text[1..]),
        b'[' => {
            let Some((&c, text_rest)) = text.split_first() else {
                return false;
            };
            match match_class(rest, c) {
                Some((true, consumed)) => match_bytes(&rest[consumed..], text_rest),
                Some((false, _)) => false,
                None => c == b'[' && match_bytes(rest, text_rest),
            }
        }
        b'\\' if !rest.is_empty() => {
            !text.is_empty() && text[0] == rest[0] && match_bytes(&rest[1..], &text[1..])
        }
        literal => !text.is_empty() && text[0] == literal && match_bytes(rest, &text[1..]),
    }
}

fn strip_leading_stars(mut pattern: &[u8]) -> &[u8] {
    while let Some((b'*', rest)) = pattern.split_first() {
        pattern = rest;
    }
    pattern
}

/// Matches `c` against the class body following `[`.
///
/// Returns whether it matched and how many pattern bytes the class used,
/// including the closing `]`. `None` when the class is never closed.
fn match_class(class: &[u8], c: u8) -> Option<(bool, usize)> {
    let mut i = 0;
    let negate = class.first() == Some(&b'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < class.len() {
        match class[i] {
            b']' => return Some((matched != negate, i + 1)),
            b'\\' if i + 1 < class.len() => {
                matched |= class[i + 1] == c;
                i += 2;
            }
            start if i + 2 < class.len() && class[i + 1] == b'-' && class[i + 2] != b']' => {
                let end = class[i + 2];
                let (low, high) = if start <= end { (start, end) } else { (end, start) };
                matched |= (low..=high).contains(&c);
                i += 3;
            }
            literal => {
                matched |= literal == c;
                i += 1;
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_glob_literal_and_star() {
        assert!(glob_match("blogs:*", "blogs:admin:limit=20:offset=0"));
        assert!(glob_match("blogs:*", "blogs:"));
        assert!(!glob_match("blogs:*", "blog:slug:x"));
        assert!(glob_match("*", ""));
        assert!(glob_match("a**b", "ab"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exactly"));
    }

    #[test]
    fn test_glob_question_mark() {
        assert!(glob_match("user:?", "user:1"));
        assert!(!glob_match("user:?", "user:"));
        assert!(!glob_match("user:?", "user:12"));
    }

    #[test]
    fn test_glob_comment_pattern() {
        let pattern = "comments:offset:*:limit:*";
        assert!(glob_match(pattern, "comments:offset:0:limit:20"));
        assert!(glob_match(pattern, "comments:offset:40:limit:5"));
        assert!(!glob_match(pattern, "blog:comments:abc"));
    }

    #[test]
    fn test_glob_classes() {
        assert!(glob_match("h[ae]llo", "hello"));
        assert!(glob_match("h[ae]llo", "hallo"));
        assert!(!glob_match("h[ae]llo", "hillo"));
        assert!(glob_match("h[^e]llo", "hallo"));
        assert!(!glob_match("h[^e]llo", "hello"));
        assert!(glob_match("h[a-c]llo", "hbllo"));
        assert!(!glob_match("h[a-c]llo", "hdllo"));
        assert!(glob_match("h[c-a]llo", "hbllo"));
    }

    #[test]
    fn test_glob_escapes() {
        assert!(glob_match(r"user:\*", "user:*"));
        assert!(!glob_match(r"user:\*", "user:abc"));
        assert!(glob_match(r"a\[b", "a[b"));
        assert!(glob_match("a[b", "a[b"));
    }

    #[tokio::test]
    async fn test_get_set_del() {
        let backend = MemoryBackend::new();

        backend.set("k", "v".into(), None).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(backend.del(&keys(&["k", "missing"])).await.unwrap(), 1);
        assert_eq!(backend.get("k").await.unwrap(), None);
        assert_eq!(backend.del(&keys(&["k"])).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let backend = MemoryBackend::new();

        backend
            .set("short", "v".into(), Some(Duration::from_secs(300)))
            .await
            .unwrap();
        backend.set("forever", "v".into(), None).await.unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(backend.get("short").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(backend.get("short").await.unwrap().is_none());
        assert!(backend.get("forever").await.unwrap().is_some());
        assert_eq!(backend.keys("*").await.unwrap(), keys(&["forever"]));
    }

    #[tokio::test]
    async fn test_scan_empty_keyspace_single_round() {
        let backend = MemoryBackend::new();

        let (cursor, found) = backend.scan(0, "*", 100).await.unwrap();
        assert_eq!(cursor, 0);
        assert!(found.is_empty());
        assert_eq!(backend.scan_calls(), 1);
    }

    #[tokio::test]
    async fn test_scan_visits_every_key_once() {
        let backend = MemoryBackend::new();
        for i in 0..25 {
            backend.set(&format!("k:{i:02}"), "v".into(), None).await.unwrap();
        }

        let mut cursor = 0;
        let mut seen = Vec::new();
        loop {
            let (next, batch) = backend.scan(cursor, "k:*", 10).await.unwrap();
            seen.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        assert_eq!(seen.len(), 25);
        assert_eq!(backend.scan_calls(), 3);
    }

    #[tokio::test]
    async fn test_scan_survives_deletes_between_rounds() {
        let backend = MemoryBackend::new();
        for i in 0..30 {
            backend.set(&format!("k:{i:02}"), "v".into(), None).await.unwrap();
        }

        let (cursor, first) = backend.scan(0, "*", 10).await.unwrap();
        assert_eq!(first.len(), 10);
        backend.del(&first).await.unwrap();

        let (cursor, second) = backend.scan(cursor, "*", 10).await.unwrap();
        assert_eq!(second.first().map(String::as_str), Some("k:10"));
        backend.del(&second).await.unwrap();

        let (cursor, third) = backend.scan(cursor, "*", 10).await.unwrap();
        assert_eq!(third.len(), 10);
        assert_eq!(cursor, 0);
    }

    #[tokio::test]
    async fn test_abandoned_scans_do_not_accumulate_cursors() {
        let backend = MemoryBackend::new();
        for i in 0..3 {
            backend
                .set(&format!("blogs:{i}"), "v".to_string(), None)
                .await
                .unwrap();
        }

        let (first, _) = backend.scan(0, "blogs:*", 1).await.unwrap();
        assert_ne!(first, 0);

        for _ in 0..MAX_OPEN_CURSORS + 10 {
            let (cursor, _) = backend.scan(0, "blogs:*", 1).await.unwrap();
            assert_ne!(cursor, 0);
        }
        assert_eq!(backend.open_cursors(), MAX_OPEN_CURSORS);

        // The oldest abandoned cursor was evicted and now ends its iteration.
        assert_eq!(
            backend.scan(first, "blogs:*", 1).await.unwrap(),
            (0, Vec::new())
        );
    }

    #[tokio::test]
    async fn test_finished_scan_releases_cursor() {
        let backend = MemoryBackend::new();
        for i in 0..5 {
            backend
                .set(&format!("blogs:{i}"), "v".to_string(), None)
                .await
                .unwrap();
        }

        let mut cursor = 0;
        loop {
            let (next, _) = backend.scan(cursor, "*", 2).await.unwrap();
            if next == 0 {
                break;
            }
            cursor = next;
        }
        assert_eq!(backend.open_cursors(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_backend_errors() {
        let backend = MemoryBackend::new();
        backend.set_available(false);

        assert!(matches!(
            backend.get("k").await,
            Err(CacheError::Unavailable(_))
        ));
        assert!(backend.ping().await.is_err());

        backend.set_available(true);
        assert!(backend.ping().await.is_ok());
    }
}
