use super::{elapsed_ms, optional_str_arg, positive_int_arg};
use crate::error::{Error, Result};
use crate::registry::{CapabilityHandler, HandlerContext};
use crate::result::ToolResult;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};
use warden_policy::{resolve_within, ToolCall, TOOL_FILE_SEARCH};

/// Results returned when the call does not ask for a limit
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Upper bound on returned results
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Upper bound on directory entries visited per search
pub const MAX_TRAVERSAL_ENTRIES: usize = 10_000;

/// Parsed search arguments
#[derive(Debug, Clone, Default)]
struct SearchQuery {
    needle: Option<String>,
    modified_after: Option<DateTime<Utc>>,
    modified_before: Option<DateTime<Utc>>,
    limit: usize,
}

impl SearchQuery {
    fn from_call(call: &ToolCall) -> Result<Self> {
        let needle = optional_str_arg(call, "query")?
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        let modified_after = optional_str_arg(call, "modifiedAfter")?
            .map(parse_timestamp)
            .transpose()?;
        let modified_before = optional_str_arg(call, "modifiedBefore")?
            .map(parse_timestamp)
            .transpose()?;
        let limit = positive_int_arg(call, "limit")?
            .map_or(DEFAULT_SEARCH_LIMIT, |n| {
                usize::try_from(n).unwrap_or(MAX_SEARCH_LIMIT).min(MAX_SEARCH_LIMIT)
            });

        Ok(Self {
            needle,
            modified_after,
            modified_before,
            limit,
        })
    }

    fn matches(&self, relative: &str, name: &str, modified: DateTime<Utc>) -> bool {
        if let Some(needle) = &self.needle {
            let in_path = relative.to_lowercase().contains(needle);
            if !in_path && !name.to_lowercase().contains(needle) {
                return false;
            }
        }
        if self.modified_after.is_some_and(|after| modified < after) {
            return false;
        }
        if self.modified_before.is_some_and(|before| modified >= before) {
            return false;
        }
        true
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) or `YYYY-MM-DD` (UTC
/// midnight).
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(Error::InvalidInput(format!("'{}' is not a valid date", value)))
}

#[derive(Debug, Clone)]
struct FileHit {
    relative: String,
    name: String,
    modified: DateTime<Utc>,
    size: u64,
}

#[derive(Debug, Default)]
struct WalkOutcome {
    hits: Vec<FileHit>,
    visited: usize,
    exhausted_budget: bool,
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Walk `root` iteratively, collecting regular files that match `query`.
///
/// Symlinks are resolved through the containment check: escaping links are
/// skipped, contained links to files are reported, and linked directories
/// are never descended into.
fn walk(root: &Path, query: &SearchQuery) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();
    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];

    'walk: while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                continue;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_hidden(&name) {
                continue;
            }
            if outcome.visited >= MAX_TRAVERSAL_ENTRIES {
                outcome.exhausted_budget = true;
                break 'walk;
            }
            outcome.visited += 1;

            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            let metadata = if file_type.is_symlink() {
                let Some(target) = resolve_within(root, &path) else {
                    debug!(path = %path.display(), "Skipping symlink that escapes the root");
                    continue;
                };
                match std::fs::metadata(&target) {
                    Ok(meta) if meta.is_file() => meta,
                    _ => continue,
                }
            } else if file_type.is_dir() {
                pending.push(path);
                continue;
            } else if file_type.is_file() {
                match entry.metadata() {
                    Ok(meta) => meta,
                    Err(_) => continue,
                }
            } else {
                continue;
            };

            let Ok(modified) = metadata.modified() else {
                continue;
            };
            let modified: DateTime<Utc> = modified.into();
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();

            if query.matches(&relative, &name, modified) {
                outcome.hits.push(FileHit {
                    relative,
                    name,
                    modified,
                    size: metadata.len(),
                });
            }
        }
    }

    outcome
}

/// Metadata-only search under the workspace root
pub struct FileSearchHandler {
    context: HandlerContext,
}

impl FileSearchHandler {
    /// Create a new file search handler
    #[must_use]
    pub fn new(context: HandlerContext) -> Self {
        Self { context }
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for FileSearchHandler {
    fn name(&self) -> &str {
        TOOL_FILE_SEARCH
    }

    async fn handle(&self, call: &ToolCall) -> ToolResult {
        let start = Instant::now();

        let root = match self.context.authorize(call) {
            Ok((root, _)) => root,
            Err(denied) => return denied,
        };
        let query = match SearchQuery::from_call(call) {
            Ok(query) => query,
            Err(e) => return ToolResult::invalid(call, e.to_string()),
        };

        let walk_root = root.clone();
        let walk_query = query.clone();
        let walked = tokio::task::spawn_blocking(move || walk(&walk_root, &walk_query)).await;
        let outcome = match walked {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Search task failed");
                return ToolResult::failure(
                    call,
                    format!("Search failed: {}", e),
                    serde_json::Value::Null,
                    elapsed_ms(start),
                );
            }
        };

        let mut hits = outcome.hits;
        hits.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.relative.cmp(&b.relative))
        });
        let truncated = outcome.exhausted_budget || hits.len() > query.limit;
        hits.truncate(query.limit);

        debug!(
            root = %root.display(),
            visited = outcome.visited,
            results = hits.len(),
            truncated,
            "Search finished"
        );

        let results: Vec<serde_json::Value> = hits
            .iter()
            .map(|hit| {
                serde_json::json!({
                    "path": hit.relative,
                    "name": hit.name,
                    "modified": hit.modified.to_rfc3339(),
                    "size": hit.size,
                })
            })
            .collect();

        ToolResult::success(
            call,
            serde_json::json!({
                "root": root.display().to_string(),
                "count": results.len(),
                "results": results,
                "truncated": truncated,
            }),
            elapsed_ms(start),
        )
    }
}
