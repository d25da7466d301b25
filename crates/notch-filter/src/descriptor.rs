use regex::Regex;

/// Compile a list of regex pattern strings, returning the first compile
/// error encountered. A filter descriptor is either a vendor rule-set
/// compiled once at process start (where a bad pattern is a programming
/// error worth surfacing) or loaded from an operator's YAML config (where
/// it is worth rejecting loudly rather than silently collecting nothing),
/// so invalid patterns are never silently dropped.
fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| Regex::new(p)).collect()
}

fn compile_pairs(pairs: &[(String, String)]) -> Result<Vec<(Regex, String)>, regex::Error> {
    pairs
        .iter()
        .map(|(pattern, replacement)| Regex::new(pattern).map(|re| (re, replacement.clone())))
        .collect()
}

/// Declarative source for a [`FilterDescriptor`] — the uncompiled,
/// serializable form used by vendor rule-set definitions and (if ever
/// loaded from config) operator-authored filters.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub ignore: Vec<String>,
    pub error: Vec<String>,
    pub drop: Vec<String>,
    pub include: Vec<String>,
    pub substitute: Vec<(String, String)>,
    pub commented: bool,
    pub comment: String,
    pub trailing_blank: bool,
}

impl FilterSpec {
    pub fn compile(&self) -> Result<FilterDescriptor, regex::Error> {
        Ok(FilterDescriptor {
            ignore: compile_all(&self.ignore)?,
            error: compile_all(&self.error)?,
            drop: compile_all(&self.drop)?,
            include: compile_all(&self.include)?,
            substitute: compile_pairs(&self.substitute)?,
            commented: self.commented,
            comment: self.comment.clone(),
            trailing_blank: self.trailing_blank,
        })
    }
}

/// A compiled line-oriented filter, per spec §4.1.
///
/// Each of the five regex classes is independently non-empty-or-not; there
/// is no separate "enabled" flag distinct from "non-empty" (unlike the
/// original Python parser, which carried both a class attribute list and a
/// `flag_*` boolean so subclasses could disable an inherited class without
/// clearing it). Rust rule-sets simply build the descriptor they want.
#[derive(Debug, Clone, Default)]
pub struct FilterDescriptor {
    pub ignore: Vec<Regex>,
    pub error: Vec<Regex>,
    pub drop: Vec<Regex>,
    pub include: Vec<Regex>,
    pub substitute: Vec<(Regex, String)>,
    pub commented: bool,
    pub comment: String,
    pub trailing_blank: bool,
}

/// A filter pipeline, or the absence of one.
///
/// `Action.filter` in the data model is `Option<FilterDescriptor>`; this
/// enum is the pipeline-side mirror of that option, so `pipeline::apply`
/// has one entry point regardless of which case applies. `Null` is the
/// spec's `NullPipeline`: used for binary payloads, it returns the input
/// unchanged and never raises `Skip` or `DeviceError`.
#[derive(Debug, Clone)]
pub enum Filter {
    Descriptor(FilterDescriptor),
    Null,
}

impl From<FilterDescriptor> for Filter {
    fn from(d: FilterDescriptor) -> Self {
        Self::Descriptor(d)
    }
}
