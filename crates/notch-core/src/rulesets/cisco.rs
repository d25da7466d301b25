//! Two actions under `ALL_REQUIRED`: `show version` (commented, INCLUDE on
//! version/usage lines) then `show running-config` (DROP on the banner
//! lines).

use notch_filter::descriptor::FilterSpec;

use crate::model::{Action, HandlingPolicy, Rule, RuleSet, TargetSpec};

pub fn ruleset() -> RuleSet {
    RuleSet {
        name: "cisco",
        header: "!RANCID-CONTENT-TYPE: cisco\n!\n".to_string(),
        default_target: TargetSpec::default(),
        rules: build_rules,
    }
}

fn build_rules() -> Result<Vec<Rule>, regex::Error> {
    let show_version_filter = FilterSpec {
        include: vec!["[Vv]ersion".to_string(), r"[Uu]sing [0-9]".to_string()],
        commented: true,
        comment: "!".to_string(),
        ..Default::default()
    }
    .compile()?;

    let show_running_config_filter = FilterSpec {
        drop: vec![
            "^Building configuration".to_string(),
            "^Current configuration".to_string(),
        ],
        trailing_blank: true,
        ..Default::default()
    }
    .compile()?;

    Ok(vec![Rule {
        policy: HandlingPolicy::AllRequired,
        actions: vec![
            Action::command((0, 0), "show version", Some(show_version_filter)),
            Action::command((0, 1), "show running-config", Some(show_running_config_filter)),
        ],
    }])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builds_one_all_required_rule_with_two_actions() {
        let rules = build_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].policy, HandlingPolicy::AllRequired);
        assert_eq!(rules[0].actions.len(), 2);
        assert_eq!(rules[0].actions[0].method, "command");
    }

    #[test]
    fn header_matches_rancid_content_type() {
        let rs = ruleset();
        assert_eq!(rs.header, "!RANCID-CONTENT-TYPE: cisco\n!\n");
    }
}
