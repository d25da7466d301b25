//! Top-level run sequence: load config, build collaborators, drive the
//! collection engine, report the outcome.
//!
//! One function does the fallible work and returns `anyhow::Result`, a
//! thin wrapper at the call site turns that into a process exit code.

use std::sync::Arc;

use notch_core::driver::{Driver, Selector};
use notch_core::error::CollectorError;
use notch_core::external::{GitRevisionControl, RevisionControl};

use crate::agent_client::HttpAgentClient;
use crate::Cli;

pub async fn run(cli: &Cli) -> i32 {
    match try_run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("notch: {err:#}");
            1
        }
    }
}

async fn try_run(cli: &Cli) -> anyhow::Result<i32> {
    let source = match std::fs::read_to_string(&cli.config) {
        Ok(s) => s,
        Err(e) => {
            let err = CollectorError::InvalidConfig(format!("reading {}: {e}", cli.config.display()));
            tracing::error!(error = %err, "configuration error");
            return Ok(err.exit_code());
        }
    };
    let config = match notch_core::config::Config::from_yaml(&source) {
        Ok(c) => c,
        Err(e) => {
            let err = CollectorError::InvalidConfig(e.to_string());
            tracing::error!(error = %err, "configuration error");
            return Ok(err.exit_code());
        }
    };

    if cli.agents.is_empty() {
        tracing::error!("no device-access agents supplied (-a/--agent or NOTCH_AGENTS)");
        return Ok(CollectorError::NoAgents.exit_code());
    }

    let device_client = Arc::new(HttpAgentClient::new(cli.agents.clone())?);
    let repo_path = config.master_repo_path.clone().unwrap_or_else(|| config.base_path.clone());
    let revision_control: Arc<dyn RevisionControl> = Arc::new(GitRevisionControl::new(repo_path));

    let selector = select(cli);
    let driver = Driver::new(config, device_client, revision_control);

    match driver.run(&selector).await {
        Ok(summary) => {
            tracing::info!(
                collections = summary.collections_run,
                written = summary.written.len(),
                excluded = summary.excluded_devices.len(),
                outcome = ?summary.commit_outcome,
                "run complete"
            );
            for line in &summary.error_report {
                tracing::warn!("{line}");
            }
            Ok(0)
        }
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            Ok(err.exit_code())
        }
    }
}

fn select(cli: &Cli) -> Selector {
    if let Some(device) = &cli.device {
        Selector::Device(device.clone())
    } else if let Some(regexp) = &cli.regexp {
        Selector::Regexp(regexp.clone())
    } else if cli.collection == "all" {
        Selector::All
    } else {
        Selector::Collection(cli.collection.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn cli(collection: &str, device: Option<&str>, regexp: Option<&str>) -> Cli {
        Cli {
            agents: vec![],
            config: PathBuf::from("notch.yaml"),
            collection: collection.to_string(),
            device: device.map(str::to_string),
            regexp: regexp.map(str::to_string),
            debug: false,
        }
    }

    #[test]
    fn device_flag_takes_priority_over_collection() {
        let c = cli("all", Some("r1"), None);
        assert!(matches!(select(&c), Selector::Device(d) if d == "r1"));
    }

    #[test]
    fn regexp_flag_takes_priority_over_collection_when_no_device() {
        let c = cli("all", None, Some("^core-.*"));
        assert!(matches!(select(&c), Selector::Regexp(r) if r == "^core-.*"));
    }

    #[test]
    fn named_collection_without_device_or_regexp() {
        let c = cli("core", None, None);
        assert!(matches!(select(&c), Selector::Collection(name) if name == "core"));
    }

    #[test]
    fn all_is_the_default_selector() {
        let c = cli("all", None, None);
        assert!(matches!(select(&c), Selector::All));
    }
}
