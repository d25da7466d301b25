//! Device Scheduler.
//!
//! One `tokio::task` is spawned per device (not per request); it owns that
//! device's FIFO queue and loops `issue -> await response -> apply filter
//! -> repeat`. "At most one outstanding request per device" is therefore a
//! property of single-task-per-device control flow rather than a
//! runtime-checked wait/signal pair.

use std::sync::Arc;
use std::time::Duration;

use notch_common::device::ResponsePayload;
use notch_filter::descriptor::Filter;
use notch_filter::pipeline::{self, PipelineOutcome};
use tokio::sync::Mutex;

use crate::collection::CollectionState;
use crate::external::{DeviceClient, DeviceRequest};
use crate::model::{ActionResult, Output, Rule, ResultStatus, TargetModeKey};

/// One flattened `(rule_index, action_index, Action)` entry in a device's
/// FIFO — built once at `Collection::start` by interleaving the
/// rule-set's rules in declared order.
pub(crate) type QueuedAction = (usize, usize, crate::model::Action);

/// Build the per-device FIFO: for every rule in declared order, append
/// that rule's actions in action-index order. Ordering across rules
/// within one device is preserved; ordering across devices is not
/// constrained.
pub(crate) fn build_queue(rules: &[Rule]) -> Vec<QueuedAction> {
    rules
        .iter()
        .enumerate()
        .flat_map(|(rule_idx, rule)| {
            rule.actions
                .iter()
                .enumerate()
                .map(move |(action_idx, action)| (rule_idx, action_idx, action.clone()))
        })
        .collect()
}

/// Drain one device's queue strictly in order, serializing requests
/// (await each response before issuing the next). Called as the body of
/// one `tokio::spawn`ed task per device.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn run_device(
    device_name: String,
    queue: Vec<QueuedAction>,
    rules: Arc<Vec<Rule>>,
    client: Arc<dyn DeviceClient>,
    state: Arc<Mutex<CollectionState>>,
    command_timeout: Option<Duration>,
    default_prefix: String,
    default_suffix: String,
) {
    for (rule_idx, action_idx, action) in queue {
        let policy = rules[rule_idx].policy;

        let stopped = {
            let st = state.lock().await;
            st.rule_stopped(&device_name, rule_idx)
        };
        if stopped {
            tracing::debug!(device = %device_name, rule = rule_idx, action = action_idx, "rule stopped, abandoning action");
            let mut st = state.lock().await;
            st.abandon_action();
            continue;
        }

        let command = action.args.get("command").and_then(|v| match v {
            crate::model::ArgValue::Text(s) => Some(s.clone()),
            crate::model::ArgValue::DevicePlaceholder => None,
        });

        tracing::debug!(device = %device_name, method = %action.method, "issuing request");
        let response = client
            .exec_request(DeviceRequest {
                device_name: device_name.clone(),
                method: action.method.clone(),
                command,
                timeout: command_timeout,
            })
            .await;

        let (status, output, diagnostic) = match response {
            Err(err) => {
                tracing::warn!(device = %device_name, error = %err, "device-access error");
                (ResultStatus::Error, None, Some(err.to_string()))
            }
            Ok(resp) => {
                if let Some(err_msg) = resp.error {
                    tracing::warn!(device = %device_name, error = %err_msg, "device reported error");
                    (ResultStatus::Error, None, Some(err_msg))
                } else {
                    match &resp.payload {
                        // Binary payloads never run through the text
                        // pipeline; the
                        // Collator writes the bytes directly.
                        ResponsePayload::Binary(bytes) => {
                            (ResultStatus::Ok, Some(Output::Binary(bytes.clone())), None)
                        }
                        ResponsePayload::Text(text) => {
                            let filter = action
                                .filter
                                .clone()
                                .map(Filter::Descriptor)
                                .unwrap_or(Filter::Null);
                            match pipeline::apply(&filter, text) {
                                PipelineOutcome::Ok(out) => {
                                    (ResultStatus::Ok, Some(Output::Text(out)), None)
                                }
                                PipelineOutcome::Skip(trigger) => {
                                    tracing::debug!(device = %device_name, trigger = %trigger, "ignore pattern matched, skipping response");
                                    (ResultStatus::Ignore, None, None)
                                }
                                PipelineOutcome::DeviceError(msg) => {
                                    (ResultStatus::Error, None, Some(msg))
                                }
                            }
                        }
                    }
                }
            }
        };

        let order = action.order;
        let target_mode = action
            .target_override
            .as_ref()
            .and_then(|t| t.mode)
            .map(TargetModeKey::from)
            .unwrap_or(TargetModeKey::Text);
        let prefix = action
            .target_override
            .as_ref()
            .map(|t| t.prefix.clone())
            .unwrap_or_else(|| default_prefix.clone());
        let suffix = action
            .target_override
            .as_ref()
            .map(|t| t.suffix.clone())
            .unwrap_or_else(|| default_suffix.clone());

        let mut st = state.lock().await;
        st.record_action_result(
            &device_name,
            rule_idx,
            policy,
            ActionResult {
                order,
                output,
                status,
                diagnostic,
            },
            &prefix,
            &suffix,
            target_mode,
        );
        drop(st);
    }

    let mut st = state.lock().await;
    st.mark_device_done(&device_name);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Action, HandlingPolicy};

    #[test]
    fn build_queue_interleaves_rules_in_declared_order_with_action_index() {
        let rules = vec![
            Rule {
                policy: HandlingPolicy::AllRequired,
                actions: vec![
                    Action::command((0, 0), "show version", None),
                    Action::command((0, 1), "show running-config", None),
                ],
            },
            Rule {
                policy: HandlingPolicy::Optional,
                actions: vec![Action::command((1, 0), "show inventory", None)],
            },
        ];
        let queue = build_queue(&rules);
        let order: Vec<(usize, usize)> = queue.iter().map(|(r, a, _)| (*r, *a)).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0)]);
    }
}
