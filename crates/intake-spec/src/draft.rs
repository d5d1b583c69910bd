use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// File name used when no explicit draft path is configured.
pub const DEFAULT_DRAFT_FILE: &str = "questionnaire-progress.json";

/// Best-effort cache of in-progress answers keyed by base-question id.
///
/// The session stays authoritative: a cached draft is only offered when no
/// response has been recorded for the question.
pub trait DraftStore {
    fn load(&self, question_id: &str) -> Option<String>;
    fn remember(&mut self, question_id: &str, value: &str);
    fn forget_all(&mut self);
}

#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    entries: BTreeMap<String, String>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self, question_id: &str) -> Option<String> {
        self.entries.get(question_id).cloned()
    }

    fn remember(&mut self, question_id: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        self.entries.insert(question_id.to_string(), value.to_string());
    }

    fn forget_all(&mut self) {
        self.entries.clear();
    }
}

/// Write-through JSON file cache. I/O failures are logged and ignored.
#[derive(Debug)]
pub struct FileDraftStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileDraftStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = read_entries(&path);
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) {
        let result = serde_json::to_string_pretty(&self.entries)
            .map_err(|err| err.to_string())
            .and_then(|contents| fs::write(&self.path, contents).map_err(|err| err.to_string()));
        if let Err(err) = result {
            warn!(path = %self.path.display(), error = %err, "failed to write draft cache");
        }
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self, question_id: &str) -> Option<String> {
        self.entries.get(question_id).cloned()
    }

    fn remember(&mut self, question_id: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        self.entries.insert(question_id.to_string(), value.to_string());
        self.flush();
    }

    fn forget_all(&mut self) {
        self.entries.clear();
        if self.path.exists()
            && let Err(err) = fs::remove_file(&self.path)
        {
            warn!(path = %self.path.display(), error = %err, "failed to remove draft cache");
        }
    }
}

fn read_entries(path: &Path) -> BTreeMap<String, String> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no draft cache loaded");
            return BTreeMap::new();
        }
    };
    serde_json::from_str(&contents).unwrap_or_else(|err| {
        warn!(path = %path.display(), error = %err, "discarding unreadable draft cache");
        BTreeMap::new()
    })
}
