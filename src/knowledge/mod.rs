// src/knowledge/mod.rs
//! # Knowledge Base
//! Flat-file store of previously answered questions. Loaded once at startup,
//! rewritten in full on every mutation. The in-memory collection is the
//! operative truth: a failed write is logged and the process keeps going.

pub mod matcher;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::ingest::types::Lang;

pub use matcher::DEFAULT_MATCH_THRESHOLD;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeEntry {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub lang: Lang,
    /// Epoch milliseconds.
    pub created_at: u64,
    #[serde(default)]
    pub access_count: u32,
    #[serde(default)]
    pub last_accessed: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeStats {
    pub total: usize,
    pub by_language: HashMap<String, usize>,
    pub top_accessed: Vec<TopEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopEntry {
    pub question: String,
    pub access_count: u32,
}

#[derive(Debug)]
pub struct KnowledgeBase {
    path: PathBuf,
    entries: Mutex<Vec<KnowledgeEntry>>,
}

impl KnowledgeBase {
    /// Read the persisted file. Missing or unparseable files start an empty
    /// collection; the knowledge base is a soft cache, not critical state.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str::<Vec<KnowledgeEntry>>(&s) {
                Ok(v) => {
                    tracing::info!(count = v.len(), path = %path.display(), "knowledge base loaded");
                    v
                }
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "knowledge base unreadable, starting empty");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Add a freshly answered question and persist. The caller is expected to
    /// have checked for a close match first.
    pub fn append(&self, question: &str, answer: &str, lang: Lang) -> KnowledgeEntry {
        let created_at = now_ms();
        let entry = KnowledgeEntry {
            id: entry_id(question, created_at),
            question: question.to_string(),
            answer: answer.to_string(),
            lang,
            created_at,
            access_count: 0,
            last_accessed: None,
        };
        let mut entries = self.lock();
        entries.push(entry.clone());
        self.persist(&entries);
        entry
    }

    /// Bump access metadata on an existing entry and persist.
    /// Returns false if the id is unknown.
    pub fn touch(&self, id: &str) -> bool {
        let mut entries = self.lock();
        let Some(e) = entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        e.access_count += 1;
        e.last_accessed = Some(now_ms());
        self.persist(&entries);
        true
    }

    /// Match `question` against the stored collection; on a hit, bump access
    /// metadata, persist, and return the updated entry.
    pub fn lookup(&self, question: &str, threshold: f64) -> Option<KnowledgeEntry> {
        let mut entries = self.lock();
        let id = matcher::find_match(question, &entries, threshold)?.id.clone();
        let e = entries.iter_mut().find(|e| e.id == id)?;
        e.access_count += 1;
        e.last_accessed = Some(now_ms());
        let hit = e.clone();
        self.persist(&entries);
        Some(hit)
    }

    /// Drop every entry and persist the empty collection.
    /// Returns the number of entries removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let n = entries.len();
        entries.clear();
        self.persist(&entries);
        n
    }

    pub fn stats(&self, top_n: usize) -> KnowledgeStats {
        let entries = self.lock();
        let mut by_language: HashMap<String, usize> = HashMap::new();
        for e in entries.iter() {
            *by_language.entry(e.lang.as_str().to_string()).or_default() += 1;
        }

        let mut ranked: Vec<&KnowledgeEntry> =
            entries.iter().filter(|e| e.access_count > 0).collect();
        ranked.sort_by(|a, b| b.access_count.cmp(&a.access_count));
        let top_accessed = ranked
            .into_iter()
            .take(top_n)
            .map(|e| TopEntry {
                question: e.question.clone(),
                access_count: e.access_count,
            })
            .collect();

        KnowledgeStats {
            total: entries.len(),
            by_language,
            top_accessed,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<KnowledgeEntry> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<KnowledgeEntry>> {
        self.entries.lock().expect("knowledge mutex poisoned")
    }

    /// Whole-file rewrite via tmp + rename. Write failures leave the
    /// in-memory state authoritative for the rest of the process lifetime.
    fn persist(&self, entries: &[KnowledgeEntry]) {
        if let Err(e) = self.write_file(entries) {
            tracing::warn!(error = %e, path = %self.path.display(), "knowledge base persist failed");
        }
    }

    fn write_file(&self, entries: &[KnowledgeEntry]) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp)?;
        f.write_all(json.as_bytes())?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Short opaque id from the question text and creation time.
fn entry_id(question: &str, created_at: u64) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(question.as_bytes());
    hasher.update(created_at.to_le_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
