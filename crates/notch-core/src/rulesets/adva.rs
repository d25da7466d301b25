//! Two actions under `ALL_REQUIRED` — `command` (IGNORE on a
//! successful-backup banner line) then `get_config` (no filter, binary,
//! target override suffix `_configuration.img.DBS`). Demonstrates that an
//! IGNORE on the first action does not stop the rule — only ERROR does,
//! and only under policies that say so — so the second action still runs.

use notch_filter::descriptor::FilterSpec;

use crate::model::{Action, HandlingPolicy, Rule, RuleSet, TargetMode, TargetSpec};

pub fn ruleset() -> RuleSet {
    RuleSet {
        name: "adva",
        header: String::new(),
        default_target: TargetSpec::default(),
        rules: build_rules,
    }
}

fn build_rules() -> Result<Vec<Rule>, regex::Error> {
    let command_filter = FilterSpec {
        ignore: vec!["^backup completed successfully".to_string()],
        ..Default::default()
    }
    .compile()?;

    let get_config_target = TargetSpec {
        prefix: String::new(),
        suffix: "_configuration.img.DBS".to_string(),
        mode: Some(TargetMode::Binary),
    };

    Ok(vec![Rule {
        policy: HandlingPolicy::AllRequired,
        actions: vec![
            Action::command((0, 0), "backup config", Some(command_filter)),
            Action::get_config((0, 1), get_config_target),
        ],
    }])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn second_action_has_binary_target_override() {
        let rules = build_rules().unwrap();
        let target = rules[0].actions[1].target_override.as_ref().unwrap();
        assert_eq!(target.suffix, "_configuration.img.DBS");
        assert_eq!(target.mode, Some(TargetMode::Binary));
    }

    #[test]
    fn first_action_has_no_target_override_and_is_unfiltered_get_config() {
        let rules = build_rules().unwrap();
        assert_eq!(rules[0].actions[1].method, "get_config");
        assert!(rules[0].actions[1].filter.is_none());
    }
}
