//! Traits modeling the two consumed external collaborators:
//! the device-access client and the revision-control backend. Modeling
//! them as traits keeps the engine testable without a real device or
//! repository; each ships a `Mock*`/`Null*` sibling next to the real
//! implementation.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use notch_common::device::{DeviceInfo, DeviceResponse};

use crate::error::{DeviceClientError, RevisionControlError};

/// One request to the device-access client.
#[derive(Debug, Clone)]
pub struct DeviceRequest {
    pub device_name: String,
    pub method: String,
    pub command: Option<String>,
    /// `None` means "defer to whatever the concrete `DeviceClient`
    /// implementation does by default".
    pub timeout: Option<Duration>,
}

#[async_trait]
pub trait DeviceClient: Send + Sync {
    async fn devices_info(
        &self,
        regex: &str,
    ) -> Result<HashMap<String, DeviceInfo>, DeviceClientError>;

    async fn exec_request(&self, req: DeviceRequest) -> Result<DeviceResponse, DeviceClientError>;
}

/// Outcome of a `RevisionControl::commit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    NoChanges,
}

pub trait RevisionControl: Send + Sync {
    /// Auto-detect adds/removes with a rename-similarity threshold
    /// (default 90%).
    fn addremove(&self) -> Result<(), RevisionControlError>;

    fn commit(
        &self,
        message: &str,
        exclude: &[String],
    ) -> Result<CommitOutcome, RevisionControlError>;
}

/// Shells out to the system `git` binary. The backend contract
/// (auto-detect renames at a similarity threshold, `commit(exclude=...)`,
/// clean no-op on no changes) maps onto `git status --porcelain` +
/// `git add -A` + `git commit`.
pub struct GitRevisionControl {
    pub repo_path: std::path::PathBuf,
    pub rename_similarity_pct: u8,
}

impl GitRevisionControl {
    #[must_use]
    pub fn new(repo_path: std::path::PathBuf) -> Self {
        Self {
            repo_path,
            rename_similarity_pct: 90,
        }
    }

    fn run(&self, args: &[&str]) -> Result<std::process::Output, RevisionControlError> {
        std::process::Command::new("git")
            .arg("-C")
            .arg(&self.repo_path)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(RevisionControlError::Io)
    }
}

impl RevisionControl for GitRevisionControl {
    fn addremove(&self) -> Result<(), RevisionControlError> {
        let similarity = format!("-M{}%", self.rename_similarity_pct);
        let out = self.run(&["add", "-A", &similarity])?;
        if !out.status.success() {
            return Err(RevisionControlError::Backend(
                String::from_utf8_lossy(&out.stderr).into_owned(),
            ));
        }
        Ok(())
    }

    fn commit(
        &self,
        message: &str,
        exclude: &[String],
    ) -> Result<CommitOutcome, RevisionControlError> {
        let status = self.run(&["status", "--porcelain"])?;
        let pending = String::from_utf8_lossy(&status.stdout);
        if pending.trim().is_empty() {
            return Ok(CommitOutcome::NoChanges);
        }

        // `git commit -- <pathspec>...` with no exclusions commits
        // everything staged; per-device exclusion needs the `:(exclude)`
        // pathspec magic, not a plain pathspec (which would instead
        // *restrict* the commit to just those paths).
        let exclude_specs: Vec<String> = exclude
            .iter()
            .map(|device| format!(":(exclude){device}"))
            .collect();
        let mut args = vec!["commit", "-m", message];
        if !exclude.is_empty() {
            args.push("--");
            args.push(".");
            for spec in &exclude_specs {
                args.push(spec.as_str());
            }
        }
        let out = self.run(&args)?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            if stderr.contains("nothing to commit") {
                return Ok(CommitOutcome::NoChanges);
            }
            return Err(RevisionControlError::Backend(stderr.into_owned()));
        }
        Ok(CommitOutcome::Committed)
    }
}

/// Test double: records calls, never touches the filesystem.
#[derive(Debug, Default)]
pub struct NullRevisionControl {
    pub committed: std::sync::Mutex<Vec<(String, Vec<String>)>>,
}

impl RevisionControl for NullRevisionControl {
    fn addremove(&self) -> Result<(), RevisionControlError> {
        Ok(())
    }

    fn commit(
        &self,
        message: &str,
        exclude: &[String],
    ) -> Result<CommitOutcome, RevisionControlError> {
        if let Ok(mut log) = self.committed.lock() {
            log.push((message.to_string(), exclude.to_vec()));
        }
        Ok(CommitOutcome::Committed)
    }
}
