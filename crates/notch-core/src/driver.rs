//! Driver.
//!
//! Sequences one invocation: load config -> build collections -> start
//! each -> wait for quiescence -> collate -> commit -> write error
//! report, as a sequence of `?`-chained calls.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::collator;
use crate::collection::Collection;
use crate::config::Config;
use crate::error::CollectorError;
use crate::external::{CommitOutcome, DeviceClient, RevisionControl};
use crate::model::Recipe;
use crate::rulesets;

/// Which collections/devices a single invocation targets — the CLI's
/// `-c/-n/-r` flags.
#[derive(Debug, Clone)]
pub enum Selector {
    All,
    Collection(String),
    Device(String),
    Regexp(String),
}

/// Outcome of one full driver run, for the CLI to report and exit on.
#[derive(Debug, Default)]
pub struct DriverSummary {
    pub collections_run: usize,
    pub written: Vec<PathBuf>,
    pub excluded_devices: HashSet<String>,
    pub commit_outcome: Option<CommitOutcome>,
    /// Per-device diagnostic lines, for the error report.
    pub error_report: Vec<String>,
}

pub struct Driver {
    config: Config,
    device_client: Arc<dyn DeviceClient>,
    revision_control: Arc<dyn RevisionControl>,
}

impl Driver {
    #[must_use]
    pub fn new(
        config: Config,
        device_client: Arc<dyn DeviceClient>,
        revision_control: Arc<dyn RevisionControl>,
    ) -> Self {
        Self {
            config,
            device_client,
            revision_control,
        }
    }

    pub async fn run(&self, selector: &Selector) -> Result<DriverSummary, CollectorError> {
        if self.config.base_path.as_os_str().is_empty() {
            return Err(CollectorError::MissingBasePath);
        }

        let collections = self.build_collections(selector).await?;
        if collections.is_empty() {
            tracing::warn!("no collections matched the selector; nothing to do");
            return Ok(DriverSummary::default());
        }

        let mut handles = Vec::with_capacity(collections.len());
        for collection in collections {
            handles.push(tokio::spawn(async move {
                let quiesced = collection.start().await;
                (collection, quiesced)
            }));
        }

        let mut finished = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok((collection, quiesced)) => {
                    if !quiesced {
                        tracing::warn!(collection = %collection.name, "collection-level timeout");
                    }
                    finished.push(collection);
                }
                Err(join_err) => {
                    tracing::error!(error = %join_err, "collection task panicked");
                }
            }
        }

        let write_summary = collator::write(&finished)
            .await
            .map_err(CollectorError::Io)?;

        let mut summary = DriverSummary {
            collections_run: finished.len(),
            written: write_summary.written,
            excluded_devices: write_summary.excluded_devices,
            commit_outcome: None,
            error_report: Vec::new(),
        };

        for device in &summary.excluded_devices {
            summary
                .error_report
                .push(format!("{device}: one or more rules failed"));
        }

        if !write_summary.any_results {
            tracing::warn!("no collection produced any result; skipping commit");
            return Ok(summary);
        }

        self.revision_control
            .addremove()
            .map_err(CollectorError::RevisionControl)?;
        let exclude: Vec<String> = summary.excluded_devices.iter().cloned().collect();
        let message = format!(
            "notch backup: {} device(s) updated, {} excluded",
            summary.written.len(),
            exclude.len()
        );
        let outcome = self
            .revision_control
            .commit(&message, &exclude)
            .map_err(CollectorError::RevisionControl)?;
        summary.commit_outcome = Some(outcome);

        if !summary.error_report.is_empty() {
            self.persist_error_report(&summary.error_report)?;
        }

        Ok(summary)
    }

    fn persist_error_report(&self, lines: &[String]) -> Result<(), CollectorError> {
        let path: PathBuf = self.config.base_path.join(&self.config.error_report_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, lines.join("\n") + "\n")?;
        Ok(())
    }

    async fn build_collections(
        &self,
        selector: &Selector,
    ) -> Result<Vec<Collection>, CollectorError> {
        let mut collections = Vec::new();
        let device_semaphore = self
            .config
            .max_in_flight_devices
            .map(|n| Arc::new(tokio::sync::Semaphore::new(n)));

        for (name, collection_cfg) in &self.config.collections {
            if let Selector::Collection(wanted) = selector {
                if wanted != "all" && wanted != name {
                    continue;
                }
            }
            if collection_cfg.recipes.is_empty() {
                return Err(CollectorError::MissingRecipes(name.clone()));
            }

            for recipe_cfg in &collection_cfg.recipes {
                let recipe = Recipe {
                    vendor: recipe_cfg.vendor.clone(),
                    ruleset: recipe_cfg.ruleset.clone(),
                    regexp: recipe_cfg.regexp.clone(),
                    path: PathBuf::from(&recipe_cfg.path),
                };

                let (ruleset, rules) = match rulesets::lookup(&recipe.ruleset) {
                    Ok(pair) => pair,
                    Err(err) => {
                        tracing::error!(recipe = %recipe.ruleset, error = %err, "abandoning recipe: unknown rule-set");
                        continue;
                    }
                };

                let query = device_query(selector, &recipe.regexp);
                let devices = self
                    .device_client
                    .devices_info(&query)
                    .await
                    .map_err(|e| CollectorError::DeviceClientConnect(e.to_string()))?;
                let device_names: Vec<String> = devices.into_keys().collect();

                let output_base = self.config.base_path.join(&recipe.path);
                let collection = Collection::new(
                    format!("{name}/{}", recipe.ruleset),
                    recipe,
                    &ruleset,
                    rules,
                    device_names,
                    Arc::clone(&self.device_client),
                    Some(Duration::from_secs(self.config.command_timeout)),
                    Duration::from_secs(self.config.collection_timeout),
                    output_base,
                )
                .with_device_semaphore(device_semaphore.clone());
                collections.push(collection);
            }
        }

        Ok(collections)
    }
}

fn device_query(selector: &Selector, recipe_regexp: &str) -> String {
    match selector {
        Selector::Device(name) => format!("^{}$", regex::escape(name)),
        Selector::Regexp(r) => r.clone(),
        Selector::All | Selector::Collection(_) => recipe_regexp.to_string(),
    }
}
