//! Only `get config` is active (key `(1, 0)`, the gap at `(0, 0)`
//! preserved) — the `get system` rule stays disabled rather than
//! resurrected.

use notch_filter::descriptor::FilterSpec;

use crate::model::{Action, HandlingPolicy, Rule, RuleSet, TargetSpec};

pub fn ruleset() -> RuleSet {
    RuleSet {
        name: "netscreen",
        header: "#RANCID-CONTENT-TYPE: netscreen\n#\n".to_string(),
        default_target: TargetSpec::default(),
        rules: build_rules,
    }
}

fn build_rules() -> Result<Vec<Rule>, regex::Error> {
    let get_config_filter = FilterSpec {
        drop: vec!["^\\s*$".to_string(), "^Total Config size ".to_string()],
        error: vec!["% Invalid input detected at '\\^' marker\\.".to_string()],
        ..Default::default()
    }
    .compile()?;

    Ok(vec![Rule {
        policy: HandlingPolicy::AllRequired,
        actions: vec![Action::command((1, 0), "get config", Some(get_config_filter))],
    }])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn only_get_config_is_active() {
        let rules = build_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].actions[0].order, (1, 0));
    }
}
