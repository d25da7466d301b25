//! Two independent `ALL_REQUIRED` rules: `show hardware info` (commented,
//! drops blank lines) then `show configuration snapshot`, which needs no
//! filtering beyond the default blank-line handling a bare descriptor
//! already provides.

use notch_filter::descriptor::FilterSpec;

use crate::model::{Action, HandlingPolicy, Rule, RuleSet, TargetSpec};

pub fn ruleset() -> RuleSet {
    RuleSet {
        name: "omniswitch",
        header: "!RANCID-CONTENT-TYPE: omniswitch\n!\n".to_string(),
        default_target: TargetSpec::default(),
        rules: build_rules,
    }
}

fn build_rules() -> Result<Vec<Rule>, regex::Error> {
    let show_hardware_filter = FilterSpec {
        drop: vec!["^\\s*$".to_string()],
        commented: true,
        comment: "! ".to_string(),
        ..Default::default()
    }
    .compile()?;

    let show_running_filter = FilterSpec {
        drop: vec!["^\\s*$".to_string()],
        ..Default::default()
    }
    .compile()?;

    Ok(vec![
        Rule {
            policy: HandlingPolicy::AllRequired,
            actions: vec![Action::command((0, 0), "show hardware info", Some(show_hardware_filter))],
        },
        Rule {
            policy: HandlingPolicy::AllRequired,
            actions: vec![Action::command(
                (1, 0),
                "show configuration snapshot",
                Some(show_running_filter),
            )],
        },
    ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builds_two_independent_single_action_rules() {
        let rules = build_rules().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].actions[0].order, (0, 0));
        assert_eq!(rules[1].actions[0].order, (1, 0));
    }
}
