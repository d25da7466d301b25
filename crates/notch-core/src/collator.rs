//! Collator / Writer.
//!
//! Eligibility (the "targets not to write" set) is computed once up
//! front, then the write loop skips any target in that set. The
//! file-handle map is local to `write` and closed deterministically at
//! end of scope via `Drop`, rather than an explicit close call.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::collection::Collection;
use crate::model::Output;

/// Outcome of one write phase, consumed by the Driver to compute the
/// commit exclusion set and the "no results at all" safety guard.
#[derive(Debug, Default)]
pub struct WriteSummary {
    pub written: Vec<PathBuf>,
    pub excluded_devices: HashSet<String>,
    /// True iff any collection produced at least one Result, eligible or
    /// not — the driver refuses to commit when this is false: an empty
    /// run must never look like "everything was deleted".
    pub any_results: bool,
}

struct PendingBlock {
    order: (u32, u32),
    output: Output,
}

/// Aggregate every completed `Collection`'s outputs into per-device
/// artifact files under `base_path`.
pub async fn write(collections: &[Collection]) -> io::Result<WriteSummary> {
    let mut summary = WriteSummary::default();
    let mut files: HashMap<PathBuf, (String, Vec<PendingBlock>)> = HashMap::new();

    for collection in collections {
        let results = collection.target_results().await;
        if !results.is_empty() {
            summary.any_results = true;
        }
        for (target, entries) in results {
            let rule_indices: HashSet<usize> =
                entries.iter().map(|r| r.order.0 as usize).collect();

            let mut eligible = true;
            for rule_idx in &rule_indices {
                if !collection.rule_successful(&target.device_name, *rule_idx).await {
                    eligible = false;
                }
            }
            if !eligible {
                tracing::debug!(device = %target.device_name, collection = %collection.name, "excluding device: rule-level error");
                summary.excluded_devices.insert(target.device_name.clone());
                continue;
            }

            let path = target.path();
            let entry = files
                .entry(path)
                .or_insert_with(|| (collection.header.clone(), Vec::new()));
            for result in entries {
                if let Some(output) = result.output {
                    entry.1.push(PendingBlock {
                        order: result.order,
                        output,
                    });
                }
            }
        }
    }

    for (path, (header, mut blocks)) in files {
        blocks.sort_by_key(|b| b.order);
        write_one_file(&path, &header, &blocks)?;
        tracing::info!(path = %path.display(), "wrote artifact");
        summary.written.push(path);
    }

    // A device excluded from one target but written successfully under a
    // different target in the same run would be a contradiction, but the
    // exclusion set is still a valid superset for the driver's commit
    // exclusion list either way.
    Ok(summary)
}

fn write_one_file(path: &Path, header: &str, blocks: &[PendingBlock]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    if !header.is_empty() {
        file.write_all(header.as_bytes())?;
    }
    for block in blocks {
        match &block.output {
            Output::Text(text) => file.write_all(text.as_bytes())?,
            Output::Binary(bytes) => file.write_all(bytes)?,
        }
    }
    Ok(())
}

fn ensure_dir(dir: &Path) -> io::Result<()> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;
    let mut perms = fs::metadata(dir)?.permissions();
    perms.set_mode(0o750);
    fs::set_permissions(dir, perms)
}
