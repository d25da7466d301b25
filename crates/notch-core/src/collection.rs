//! `Collection` owns one recipe x device-set. It hosts the per-device
//! scheduler tasks, ingests their results under a single shared,
//! mutex-guarded `CollectionState` — a results map mutated from per-device
//! I/O callbacks, serialized by one lock rather than finer-grained locking
//! — and exposes a read-only view to the Collator once complete.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;

use crate::external::DeviceClient;
use crate::model::{
    ActionResult, HandlingPolicy, Recipe, Rule, RuleRunState, RuleSet, TargetModeKey,
};
use crate::scheduler::{build_queue, run_device};
use crate::target_cache::TargetCache;

/// Runtime state mutated only from within per-device task callbacks,
/// serialized by this mutex.
#[derive(Debug)]
pub struct CollectionState {
    rule_states: HashMap<(String, usize), RuleRunState>,
    results: HashMap<crate::model::Target, Vec<ActionResult>>,
    target_cache: TargetCache,
    devices_done: HashSet<String>,
    devices_total: usize,
    num_resp_received: u64,
    num_resp_target: u64,
}

impl CollectionState {
    fn new(base_path: PathBuf, devices_total: usize, num_resp_target: u64) -> Self {
        Self {
            rule_states: HashMap::new(),
            results: HashMap::new(),
            target_cache: TargetCache::new(base_path),
            devices_done: HashSet::new(),
            devices_total,
            num_resp_received: 0,
            num_resp_target,
        }
    }

    pub(crate) fn rule_stopped(&self, device: &str, rule_idx: usize) -> bool {
        self.rule_states
            .get(&(device.to_string(), rule_idx))
            .is_some_and(|s| s.stopped)
    }

    /// An action was never issued because its rule had already stopped;
    /// it is removed from the target count rather than counted as
    /// received — abandoned actions are never scheduled, so they never
    /// generate a callback.
    pub(crate) fn abandon_action(&mut self) {
        self.num_resp_target = self.num_resp_target.saturating_sub(1);
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn record_action_result(
        &mut self,
        device: &str,
        rule_idx: usize,
        policy: HandlingPolicy,
        result: ActionResult,
        prefix: &str,
        suffix: &str,
        mode: TargetModeKey,
    ) {
        self.num_resp_received += 1;
        let status = result.status;
        self.rule_states
            .entry((device.to_string(), rule_idx))
            .or_default()
            .record(policy, status);

        if status == crate::model::ResultStatus::Ignore {
            // Never written, never counted as an error.
            return;
        }
        let target = self.target_cache.resolve(device, prefix, suffix, mode);
        self.results.entry(target).or_default().push(result);
    }

    pub(crate) fn mark_device_done(&mut self, device: &str) {
        self.devices_done.insert(device.to_string());
    }

    fn is_complete(&self) -> bool {
        self.devices_done.len() >= self.devices_total
    }

    /// Force every not-yet-completed action of this rule to become a
    /// synthetic ERROR `ActionResult` for this device, so the collation
    /// eligibility check (which only sees `results`, not `rule_states`)
    /// picks up the device as excluded — used when the collection-level
    /// timeout fires. Actions already accounted for (`completed`) are left
    /// alone; a rule already `stopped` is left alone entirely, since it
    /// already has a determinate outcome.
    fn timeout_abandon(
        &mut self,
        device: &str,
        rule_idx: usize,
        rule: &Rule,
        default_prefix: &str,
        default_suffix: &str,
    ) {
        let (completed, stopped) = self
            .rule_states
            .get(&(device.to_string(), rule_idx))
            .map_or((0, false), |s| (s.completed as usize, s.stopped));
        if stopped {
            return;
        }

        for action in rule.actions.iter().skip(completed) {
            let mode = action
                .target_override
                .as_ref()
                .and_then(|t| t.mode)
                .map(TargetModeKey::from)
                .unwrap_or(TargetModeKey::Text);
            let prefix = action
                .target_override
                .as_ref()
                .map(|t| t.prefix.clone())
                .unwrap_or_else(|| default_prefix.to_string());
            let suffix = action
                .target_override
                .as_ref()
                .map(|t| t.suffix.clone())
                .unwrap_or_else(|| default_suffix.to_string());

            self.rule_states
                .entry((device.to_string(), rule_idx))
                .or_default()
                .record(rule.policy, crate::model::ResultStatus::Error);

            let target = self.target_cache.resolve(device, &prefix, &suffix, mode);
            self.results.entry(target).or_default().push(ActionResult {
                order: action.order,
                output: None,
                status: crate::model::ResultStatus::Error,
                diagnostic: Some("collection timed out".to_string()),
            });
        }
    }

    /// `(num_resp_received, num_resp_target)`.
    #[must_use]
    pub fn counters(&self) -> (u64, u64) {
        (self.num_resp_received, self.num_resp_target)
    }
}

/// Runtime container for one recipe x device-set execution.
pub struct Collection {
    pub name: String,
    pub recipe: Recipe,
    pub header: String,
    pub default_prefix: String,
    pub default_suffix: String,
    rules: Arc<Vec<Rule>>,
    devices: Vec<String>,
    client: Arc<dyn DeviceClient>,
    command_timeout: Option<Duration>,
    collection_timeout: Duration,
    state: Arc<Mutex<CollectionState>>,
    start: tokio::time::Instant,
    /// Admission control standing in for the device-access client's own
    /// connection pool — when set, at most this many
    /// per-device tasks run concurrently. `None` is unbounded.
    device_semaphore: Option<Arc<Semaphore>>,
}

impl Collection {
    #[must_use]
    pub fn new(
        name: String,
        recipe: Recipe,
        ruleset: &RuleSet,
        rules: Vec<Rule>,
        devices: Vec<String>,
        client: Arc<dyn DeviceClient>,
        command_timeout: Option<Duration>,
        collection_timeout: Duration,
        output_base: PathBuf,
    ) -> Self {
        let devices_total = devices.len();
        let num_resp_target: u64 = devices_total as u64
            * rules.iter().map(|r| r.actions.len() as u64).sum::<u64>();
        let default_prefix = ruleset.default_target.prefix.clone();
        let default_suffix = ruleset.default_target.suffix.clone();
        Self {
            name,
            recipe,
            header: ruleset.header.clone(),
            default_prefix,
            default_suffix,
            rules: Arc::new(rules),
            devices,
            client,
            command_timeout,
            collection_timeout,
            state: Arc::new(Mutex::new(CollectionState::new(
                output_base,
                devices_total,
                num_resp_target,
            ))),
            start: tokio::time::Instant::now(),
            device_semaphore: None,
        }
    }

    /// Caps how many of this collection's devices run concurrently,
    /// sharing a semaphore across collections when one is supplied from
    /// `Config::max_in_flight_devices`.
    #[must_use]
    pub fn with_device_semaphore(mut self, sem: Option<Arc<Semaphore>>) -> Self {
        self.device_semaphore = sem;
        self
    }

    #[must_use]
    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Run every device's scheduler task to quiescence, bounded by
    /// `collection_timeout`. Returns `true` if every
    /// device drained naturally, `false` if the collection-timeout fired
    /// and some devices were abandoned.
    pub async fn start(&self) -> bool {
        if self.devices.is_empty() {
            tracing::warn!(collection = %self.name, "no devices matched this recipe's regex");
            return true;
        }

        let queue = build_queue(&self.rules);
        let mut handles: Vec<(String, JoinHandle<()>)> = Vec::with_capacity(self.devices.len());
        for device in &self.devices {
            let device_name = device.clone();
            let queue = queue.clone();
            let rules = Arc::clone(&self.rules);
            let client = Arc::clone(&self.client);
            let state = Arc::clone(&self.state);
            let command_timeout = self.command_timeout;
            let default_prefix = self.default_prefix.clone();
            let default_suffix = self.default_suffix.clone();
            let semaphore = self.device_semaphore.clone();
            let handle = tokio::spawn(async move {
                // Hold a permit for the device's whole FIFO run when a
                // cap is configured, so at most `max_in_flight_devices`
                // devices are in flight across the process at once.
                let _permit = match &semaphore {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };
                run_device(
                    device_name,
                    queue,
                    rules,
                    client,
                    state,
                    command_timeout,
                    default_prefix,
                    default_suffix,
                )
                .await;
            });
            handles.push((device.clone(), handle));
        }

        let join_all = async {
            for (_, handle) in &mut handles {
                let _ = handle.await;
            }
        };

        match tokio::time::timeout(self.collection_timeout, join_all).await {
            Ok(()) => true,
            Err(_) => {
                tracing::error!(collection = %self.name, "collection timed out; abandoning outstanding devices");
                let mut st = self.state.lock().await;
                for (device, handle) in &handles {
                    if !handle.is_finished() {
                        handle.abort();
                        for rule_idx in 0..self.rules.len() {
                            st.timeout_abandon(
                                device,
                                rule_idx,
                                &self.rules[rule_idx],
                                &self.default_prefix,
                                &self.default_suffix,
                            );
                        }
                        st.mark_device_done(device);
                    }
                }
                false
            }
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        // Synchronous accessor for tests/CLI summaries: best-effort lock.
        self.state
            .try_lock()
            .map(|st| st.is_complete())
            .unwrap_or(false)
    }

    /// Whether every rule in the schedule is successful for this device —
    /// i.e. whether the device is "clean".
    pub async fn is_device_clean(&self, device: &str) -> bool {
        let st = self.state.lock().await;
        (0..self.rules.len()).all(|rule_idx| {
            st.rule_states
                .get(&(device.to_string(), rule_idx))
                .is_none_or(|s| s.is_successful(self.rules[rule_idx].policy))
        })
    }

    /// Whether one specific rule is successful for this device — used by
    /// the Collator to decide per-target (not just per-device) eligibility:
    /// every rule contributing Results to a given Target must succeed for
    /// that Target to be written.
    pub async fn rule_successful(&self, device: &str, rule_idx: usize) -> bool {
        let st = self.state.lock().await;
        st.rule_states
            .get(&(device.to_string(), rule_idx))
            .is_none_or(|s| s.is_successful(self.rules[rule_idx].policy))
    }

    /// Read-only snapshot of per-target results, for the Collator.
    pub async fn target_results(&self) -> HashMap<crate::model::Target, Vec<ActionResult>> {
        self.state.lock().await.results.clone()
    }

    pub async fn counters(&self) -> (u64, u64) {
        self.state.lock().await.counters()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::DeviceClientError;
    use crate::model::{Action, HandlingPolicy, RuleSet, TargetSpec};
    use notch_common::device::{DeviceInfo, DeviceResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Tracks peak concurrent `exec_request` calls in flight, to verify
    /// `with_device_semaphore` actually bounds per-device concurrency.
    struct ConcurrencyTrackingClient {
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl DeviceClient for ConcurrencyTrackingClient {
        async fn devices_info(
            &self,
            _regex: &str,
        ) -> Result<HashMap<String, DeviceInfo>, DeviceClientError> {
            Ok(HashMap::new())
        }

        async fn exec_request(
            &self,
            req: crate::external::DeviceRequest,
        ) -> Result<DeviceResponse, DeviceClientError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(DeviceResponse::ok_text(req.device_name.clone(), "ok"))
        }
    }

    fn one_action_ruleset() -> (RuleSet, Vec<Rule>) {
        let rs = RuleSet {
            name: "test",
            header: String::new(),
            default_target: TargetSpec::default(),
            rules: || {
                Ok(vec![Rule {
                    policy: HandlingPolicy::AllRequired,
                    actions: vec![Action::command((0, 0), "show version", None)],
                }])
            },
        };
        let rules = (rs.rules)().unwrap();
        (rs, rules)
    }

    #[tokio::test(start_paused = true)]
    async fn device_semaphore_caps_concurrent_devices() {
        let peak = Arc::new(AtomicUsize::new(0));
        let client: Arc<dyn DeviceClient> = Arc::new(ConcurrencyTrackingClient {
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::clone(&peak),
        });
        let (rs, rules) = one_action_ruleset();
        let devices: Vec<String> = (0..6).map(|i| format!("r{i}")).collect();
        let collection = Collection::new(
            "demo".to_string(),
            Recipe {
                vendor: "test".to_string(),
                ruleset: "test".to_string(),
                regexp: ".*".to_string(),
                path: PathBuf::from("test"),
            },
            &rs,
            rules,
            devices,
            client,
            None,
            Duration::from_secs(5),
            PathBuf::from("/tmp/notch-test-unused"),
        )
        .with_device_semaphore(Some(Arc::new(Semaphore::new(2))));

        collection.start().await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn no_semaphore_allows_full_concurrency() {
        let peak = Arc::new(AtomicUsize::new(0));
        let client: Arc<dyn DeviceClient> = Arc::new(ConcurrencyTrackingClient {
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::clone(&peak),
        });
        let (rs, rules) = one_action_ruleset();
        let devices: Vec<String> = (0..6).map(|i| format!("r{i}")).collect();
        let collection = Collection::new(
            "demo".to_string(),
            Recipe {
                vendor: "test".to_string(),
                ruleset: "test".to_string(),
                regexp: ".*".to_string(),
                path: PathBuf::from("test"),
            },
            &rs,
            rules,
            devices,
            client,
            None,
            Duration::from_secs(5),
            PathBuf::from("/tmp/notch-test-unused"),
        );

        collection.start().await;
        assert_eq!(peak.load(Ordering::SeqCst), 6);
    }
}
