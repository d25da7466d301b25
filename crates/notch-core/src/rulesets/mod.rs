//! Rule-Set Registry.
//!
//! A process-wide, immutable map from vendor tag to rule-set constructor,
//! populated at first access via `once_cell::sync::Lazy`; no dynamic
//! registration is required after process start.

pub mod adva;
pub mod cisco;
pub mod juniper;
pub mod netscreen;
pub mod nortel_esr;
pub mod omniswitch;
pub mod telco;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::RuleSetError;
use crate::model::RuleSet;

static REGISTRY: Lazy<HashMap<&'static str, fn() -> RuleSet>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, fn() -> RuleSet> = HashMap::new();
    m.insert("cisco", cisco::ruleset);
    m.insert("telco", telco::ruleset);
    m.insert("adva", adva::ruleset);
    m.insert("juniper", juniper::ruleset);
    m.insert("netscreen", netscreen::ruleset);
    m.insert("omniswitch", omniswitch::ruleset);
    m.insert("nortel_esr", nortel_esr::ruleset);
    m
});

/// Look up a rule-set by vendor tag and compile its filter patterns.
/// Unknown tags and invalid patterns are both recoverable conditions: the
/// calling `Collection` logs and abandons that recipe without aborting
/// sibling collections.
pub fn lookup(vendor: &str) -> Result<(RuleSet, Vec<crate::model::Rule>), RuleSetError> {
    let ctor = REGISTRY
        .get(vendor)
        .ok_or_else(|| RuleSetError::Unknown(vendor.to_string()))?;
    let ruleset = ctor();
    let rules = (ruleset.rules)()
        .map_err(|e| RuleSetError::InvalidPattern(vendor.to_string(), e.to_string()))?;
    Ok((ruleset, rules))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn known_vendors_resolve() {
        assert!(lookup("cisco").is_ok());
        assert!(lookup("telco").is_ok());
        assert!(lookup("adva").is_ok());
        assert!(lookup("juniper").is_ok());
        assert!(lookup("netscreen").is_ok());
        assert!(lookup("omniswitch").is_ok());
        assert!(lookup("nortel_esr").is_ok());
    }

    #[test]
    fn unknown_vendor_is_rejected() {
        let err = lookup("nonexistent-vendor").unwrap_err();
        assert_eq!(err, RuleSetError::Unknown("nonexistent-vendor".to_string()));
    }
}
