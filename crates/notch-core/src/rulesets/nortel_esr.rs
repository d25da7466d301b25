//! One rule, one action (`show config`); the only ruleset in this
//! registry to exercise the SUBSTITUTE filter class, stripping the
//! volatile `CF=...` suffix off slot banner lines while keeping the rest
//! of the line via backreference.

use notch_filter::descriptor::FilterSpec;

use crate::model::{Action, HandlingPolicy, Rule, RuleSet, TargetSpec};

pub fn ruleset() -> RuleSet {
    RuleSet {
        name: "nortel_esr",
        header: "#RANCID-CONTENT-TYPE: nortel_esr\n#\n".to_string(),
        default_target: TargetSpec::default(),
        rules: build_rules,
    }
}

fn build_rules() -> Result<Vec<Rule>, regex::Error> {
    let show_config_filter = FilterSpec {
        drop: vec![
            "^\\s*$".to_string(),
            r"^Preparing to Display Configuration\.\.".to_string(),
            "^# (MON|TUE|WED|THU|FRI|SAT|SUN) [A-Z]+".to_string(),
        ],
        substitute: vec![(r"(^# Slot.+) CF=.+$".to_string(), "$1".to_string())],
        error: vec!["not found in path ".to_string()],
        ..Default::default()
    }
    .compile()?;

    Ok(vec![Rule {
        policy: HandlingPolicy::AllRequired,
        actions: vec![Action::command((0, 0), "show config", Some(show_config_filter))],
    }])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use notch_filter::descriptor::Filter;
    use notch_filter::pipeline::{apply, PipelineOutcome};

    #[test]
    fn substitutes_slot_cf_suffix() {
        let rules = build_rules().unwrap();
        let filter = rules[0].actions[0].filter.clone().unwrap();
        let outcome = apply(&Filter::Descriptor(filter), "# Slot 1 CF=abc123def");
        let PipelineOutcome::Ok(text) = outcome else {
            panic!("expected Ok outcome");
        };
        assert_eq!(text, "# Slot 1");
    }
}
