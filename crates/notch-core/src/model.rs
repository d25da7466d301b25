//! Core data model: Action, Rule, Target, Result, Recipe.
//!
//! `Action` is a plain struct rather than a positional tuple of context
//! values, so a callback's device/rule/action identity is named rather
//! than indexed; `HandlingPolicy` and `ResultStatus` are closed enums in
//! place of loosely-typed integer constants.

use std::collections::BTreeMap;
use std::path::PathBuf;

use notch_filter::descriptor::FilterDescriptor;

/// A single argument value passed to a device-access request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Text(String),
    DevicePlaceholder,
}

/// An immutable description of one device operation.
#[derive(Debug, Clone)]
pub struct Action {
    pub method: String,
    pub args: BTreeMap<String, ArgValue>,
    /// `(rule_index, action_index)` — deterministic ordering key used both
    /// for per-device issue order and for sorting Collator output blocks.
    pub order: (u32, u32),
    pub filter: Option<FilterDescriptor>,
    pub target_override: Option<TargetSpec>,
}

impl Action {
    #[must_use]
    pub fn command(order: (u32, u32), command_text: &str, filter: Option<FilterDescriptor>) -> Self {
        let mut args = BTreeMap::new();
        args.insert("command".to_string(), ArgValue::Text(command_text.to_string()));
        args.insert("device_name".to_string(), ArgValue::DevicePlaceholder);
        Self {
            method: "command".to_string(),
            args,
            order,
            filter,
            target_override: None,
        }
    }

    #[must_use]
    pub fn get_config(order: (u32, u32), target_override: TargetSpec) -> Self {
        let mut args = BTreeMap::new();
        args.insert("device_name".to_string(), ArgValue::DevicePlaceholder);
        Self {
            method: "get_config".to_string(),
            args,
            order,
            filter: None,
            target_override: Some(target_override),
        }
    }

    #[must_use]
    pub fn with_target_override(mut self, t: TargetSpec) -> Self {
        self.target_override = Some(t);
        self
    }
}

/// Rule success criterion over per-action statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlingPolicy {
    Optional,
    AllRequired,
    AnyRequired,
    FirstOrAllOthers,
}

/// An ordered list of actions with a handling policy.
#[derive(Debug, Clone)]
pub struct Rule {
    pub policy: HandlingPolicy,
    pub actions: Vec<Action>,
}

/// Per-device run state for one [`Rule`], owned exclusively by the
/// [`crate::collection::Collection`] that scheduled it.
#[derive(Debug, Clone, Default)]
pub struct RuleRunState {
    pub statuses: Vec<ResultStatus>,
    pub stopped: bool,
    pub completed: u32,
}

impl RuleRunState {
    /// Derive whether the rule stops and what the device's Result status
    /// becomes, given the newly-completed action's raw status and the
    /// rule's policy.
    pub fn record(&mut self, policy: HandlingPolicy, status: ResultStatus) {
        self.statuses.push(status);
        self.completed += 1;
        match policy {
            HandlingPolicy::Optional | HandlingPolicy::AnyRequired => {}
            HandlingPolicy::AllRequired => {
                if status == ResultStatus::Error {
                    self.stopped = true;
                }
            }
            HandlingPolicy::FirstOrAllOthers => {
                // Only the first action's outcome can stop the rule: a
                // successful first action means the "all others" are
                // never scheduled; a failed first action means every
                // remaining action runs and must succeed.
                if self.completed == 1 && status == ResultStatus::Ok {
                    self.stopped = true;
                }
            }
        }
    }

    /// Whether this rule is successful for its device.
    #[must_use]
    pub fn is_successful(&self, policy: HandlingPolicy) -> bool {
        match policy {
            HandlingPolicy::Optional => true,
            HandlingPolicy::AllRequired => {
                self.statuses.iter().all(|s| *s != ResultStatus::Error)
            }
            HandlingPolicy::AnyRequired => {
                self.statuses.iter().any(|s| *s == ResultStatus::Ok)
            }
            HandlingPolicy::FirstOrAllOthers => match self.statuses.first() {
                Some(ResultStatus::Ok) => true,
                Some(ResultStatus::Error) => {
                    self.statuses[1..].iter().all(|s| *s == ResultStatus::Ok)
                }
                _ => false,
            },
        }
    }
}

/// Status of one [`ActionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Pending,
    Ok,
    Error,
    Ignore,
}

/// Processed output of one action, post-filter. Text passes through the
/// line-oriented pipeline; binary payloads bypass it
/// entirely (the `NullPipeline` case) and are carried as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Text(String),
    Binary(Vec<u8>),
}

/// A tuple of (ordering key, raw-ish metadata, processed output, status).
/// Named `ActionResult` to avoid colliding with `std::result::Result`.
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub order: (u32, u32),
    pub output: Option<Output>,
    pub status: ResultStatus,
    pub diagnostic: Option<String>,
}

/// Output mode for a [`Target`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMode {
    Text,
    Binary,
}

/// Declarative override carried by an [`Action`], used to resolve a
/// concrete [`Target`].
#[derive(Debug, Clone, Default)]
pub struct TargetSpec {
    pub prefix: String,
    pub suffix: String,
    pub mode: Option<TargetMode>,
}

/// Destination artifact descriptor. The final path is
/// `base_path/prefix+device_name+suffix` — both `device_name` and
/// `base_path` must be set before `path()` is called.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub device_name: String,
    pub base_path: PathBuf,
    pub prefix: String,
    pub suffix: String,
    pub mode: TargetModeKey,
}

/// `TargetMode` is not `Hash`/`Eq` (it need not be for the model proper),
/// but `TargetCache`'s key requires both; this newtype carries the same
/// two states with the derives the cache needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetModeKey {
    Text,
    Binary,
}

impl From<TargetMode> for TargetModeKey {
    fn from(m: TargetMode) -> Self {
        match m {
            TargetMode::Text => Self::Text,
            TargetMode::Binary => Self::Binary,
        }
    }
}

impl Target {
    /// `base_path/prefix+device_name+suffix`.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.base_path
            .join(format!("{}{}{}", self.prefix, self.device_name, self.suffix))
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.mode == TargetModeKey::Binary
    }
}

/// A named, vendor-tagged bundle of rules plus header and default target
/// template.
#[derive(Clone)]
pub struct RuleSet {
    pub name: &'static str,
    pub header: String,
    pub default_target: TargetSpec,
    pub rules: fn() -> Result<Vec<Rule>, regex::Error>,
}

/// Configuration unit pairing a rule-set with a device-selection regex and
/// an output sub-path.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub vendor: String,
    pub ruleset: String,
    pub regexp: String,
    pub path: PathBuf,
}
