//! Two independent `ALL_REQUIRED` rules, one action each, rather than
//! cisco/telco's single two-action rule — `show version` and `show
//! config` are separate rules, so a failure on one does not stop the
//! other from being scheduled.

use notch_filter::descriptor::FilterSpec;

use crate::model::{Action, HandlingPolicy, Rule, RuleSet, TargetSpec};

pub fn ruleset() -> RuleSet {
    RuleSet {
        name: "juniper",
        header: "#RANCID-CONTENT-TYPE: juniper\n#\n".to_string(),
        default_target: TargetSpec::default(),
        rules: build_rules,
    }
}

fn build_rules() -> Result<Vec<Rule>, regex::Error> {
    let show_version_filter = FilterSpec {
        drop: vec!["^\\s*$".to_string(), "^## ".to_string()],
        error: vec!["^error: syntax error".to_string()],
        commented: true,
        comment: "# ".to_string(),
        ..Default::default()
    }
    .compile()?;

    let show_config_filter = FilterSpec {
        drop: vec!["^\\s*$".to_string()],
        error: vec!["^error: syntax error".to_string()],
        trailing_blank: true,
        ..Default::default()
    }
    .compile()?;

    Ok(vec![
        Rule {
            policy: HandlingPolicy::AllRequired,
            actions: vec![Action::command((0, 0), "show version", Some(show_version_filter))],
        },
        Rule {
            policy: HandlingPolicy::AllRequired,
            actions: vec![Action::command((1, 0), "show config", Some(show_config_filter))],
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
        assert_eq!(rules[0].actions.len(), 1);
        assert_eq!(rules[1].actions.len(), 1);
        assert_eq!(rules[0].actions[0].order, (0, 0));
        assert_eq!(rules[1].actions[0].order, (1, 0));
    }
}
