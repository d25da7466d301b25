//! Same shape as [`super::cisco`] with telco-specific drop patterns.

use notch_filter::descriptor::FilterSpec;

use crate::model::{Action, HandlingPolicy, Rule, RuleSet, TargetSpec};

pub fn ruleset() -> RuleSet {
    RuleSet {
        name: "telco",
        header: "!RANCID-CONTENT-TYPE: telco\n!\n".to_string(),
        default_target: TargetSpec::default(),
        rules: build_rules,
    }
}

fn build_rules() -> Result<Vec<Rule>, regex::Error> {
    let show_version_filter = FilterSpec {
        include: vec!["[Vv]ersion".to_string()],
        commented: true,
        comment: "!".to_string(),
        ..Default::default()
    }
    .compile()?;

    let show_config_filter = FilterSpec {
        drop: vec![
            "^Building the configuration".to_string(),
            "^Current configuration:".to_string(),
            "^Router Manager Configuration:".to_string(),
        ],
        trailing_blank: true,
        ..Default::default()
    }
    .compile()?;

    Ok(vec![Rule {
        policy: HandlingPolicy::AllRequired,
        actions: vec![
            Action::command((0, 0), "show version", Some(show_version_filter)),
            Action::command((0, 1), "show running-config", Some(show_config_filter)),
        ],
    }])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn drops_telco_specific_banner_lines() {
        let rules = build_rules().unwrap();
        let filter = rules[0].actions[1].filter.as_ref().unwrap();
        assert_eq!(filter.drop.len(), 3);
    }
}
