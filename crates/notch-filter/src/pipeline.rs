use crate::descriptor::{Filter, FilterDescriptor};

/// The outcome of applying a filter to one command response.
///
/// A tagged result rather than an exception type: `apply` returns a
/// variant and the caller (in `notch-core`) matches on it to derive a
/// `ResultStatus` instead of unwinding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Filtering completed; `0` is the processed text.
    Ok(String),
    /// An `IGNORE` pattern matched — the whole response is discarded.
    /// Carries the text that triggered the match, for logging.
    Skip(String),
    /// An `ERROR` pattern matched — the device is reporting an error in
    /// its own response text.
    DeviceError(String),
}

/// Apply a filter to a single command response.
///
/// `Filter::Null` returns the input unchanged and is used for binary
/// payloads.
#[must_use]
pub fn apply(filter: &Filter, input: &str) -> PipelineOutcome {
    match filter {
        Filter::Null => PipelineOutcome::Ok(input.to_string()),
        Filter::Descriptor(d) => apply_descriptor(d, input),
    }
}

fn apply_descriptor(d: &FilterDescriptor, input: &str) -> PipelineOutcome {
    let mut kept: Vec<String> = Vec::new();
    // `commented` gates whether `comment` is actually used as a prefix,
    // mirroring the original parser's `comment = self.comment if
    // self.commented else ''`.
    let comment: &str = if d.commented { &d.comment } else { "" };

    for line in input.lines() {
        // (a) IGNORE — discard the entire response.
        if let Some(m) = d.ignore.iter().find_map(|re| re.find(line)) {
            return PipelineOutcome::Skip(m.as_str().to_string());
        }
        // (b) ERROR — the device is reporting an error.
        if let Some(m) = d.error.iter().find_map(|re| re.find(line)) {
            return PipelineOutcome::DeviceError(format!(
                "Error from device: {}",
                m.as_str()
            ));
        }
        // (c) DROP — exclude this line.
        let dropped = d.drop.iter().any(|re| re.is_match(line));

        // (d) SUBSTITUTE — rewrite the line in sequence.
        let mut line = line.to_string();
        for (re, replacement) in &d.substitute {
            line = re.replace_all(&line, replacement.as_str()).into_owned();
        }

        // (e) INCLUDE overrides "not dropped" when non-empty.
        if !d.include.is_empty() {
            let commented_line = format!("{comment}{line}");
            if d.include.iter().any(|re| re.is_match(&commented_line)) {
                kept.push(prefix(comment, &line));
            }
        } else if !dropped && !line.is_empty() {
            // (f) otherwise, non-empty surviving lines pass through.
            kept.push(prefix(comment, &line));
        }
    }

    let mut result = kept.join("\n");
    if d.trailing_blank {
        if comment.is_empty() {
            result.push('\n');
        } else {
            result.push('\n');
            result.push_str(comment);
            result.push('\n');
        }
    }
    PipelineOutcome::Ok(result)
}

fn prefix(comment: &str, line: &str) -> String {
    if comment.is_empty() {
        line.to_string()
    } else {
        format!("{comment}{line}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptor::FilterSpec;

    fn descriptor(spec: FilterSpec) -> FilterDescriptor {
        spec.compile().unwrap()
    }

    #[test]
    fn null_filter_passes_through_unchanged() {
        let outcome = apply(&Filter::Null, "raw\nbytes-as-text\n");
        assert_eq!(
            outcome,
            PipelineOutcome::Ok("raw\nbytes-as-text\n".to_string())
        );
    }

    #[test]
    fn ignore_pattern_short_circuits_with_skip() {
        let d = descriptor(FilterSpec {
            ignore: vec!["^backup completed successfully".to_string()],
            ..Default::default()
        });
        let outcome = apply(&d.into(), "backup completed successfully\nmore text");
        assert!(matches!(outcome, PipelineOutcome::Skip(_)));
    }

    #[test]
    fn error_pattern_reports_device_error() {
        let d = descriptor(FilterSpec {
            error: vec!["% Invalid input".to_string()],
            ..Default::default()
        });
        let outcome = apply(&d.into(), "show version\n% Invalid input detected");
        match outcome {
            PipelineOutcome::DeviceError(msg) => assert!(msg.contains("Invalid input")),
            other => panic!("expected DeviceError, got {other:?}"),
        }
    }

    #[test]
    fn drop_pattern_excludes_matching_lines() {
        let d = descriptor(FilterSpec {
            drop: vec!["^Building configuration".to_string()],
            ..Default::default()
        });
        let outcome = apply(
            &d.into(),
            "Building configuration...\nhostname r1\ninterface eth0",
        );
        assert_eq!(
            outcome,
            PipelineOutcome::Ok("hostname r1\ninterface eth0".to_string())
        );
    }

    #[test]
    fn substitute_rewrites_lines_before_include_or_drop_decision() {
        let d = descriptor(FilterSpec {
            substitute: vec![("secret=\\S+".to_string(), "secret=REDACTED".to_string())],
            ..Default::default()
        });
        let outcome = apply(&d.into(), "config secret=topsecret123");
        assert_eq!(
            outcome,
            PipelineOutcome::Ok("config secret=REDACTED".to_string())
        );
    }

    #[test]
    fn include_overrides_not_dropped_semantics() {
        let d = descriptor(FilterSpec {
            include: vec!["version".to_string()],
            ..Default::default()
        });
        let outcome = apply(
            &d.into(),
            "Cisco IOS version 15.1\nuptime is 3 days\nUsing 10 percent",
        );
        assert_eq!(
            outcome,
            PipelineOutcome::Ok("Cisco IOS version 15.1\nUsing 10 percent".to_string())
        );
    }

    #[test]
    fn empty_lines_are_dropped_without_include() {
        let d = descriptor(FilterSpec::default());
        let outcome = apply(&d.into(), "line one\n\nline two\n");
        assert_eq!(
            outcome,
            PipelineOutcome::Ok("line one\nline two".to_string())
        );
    }

    #[test]
    fn commented_output_prefixes_surviving_lines() {
        let d = descriptor(FilterSpec {
            commented: true,
            comment: "! ".to_string(),
            ..Default::default()
        });
        let outcome = apply(&d.into(), "hostname r1");
        assert_eq!(outcome, PipelineOutcome::Ok("! hostname r1".to_string()));
    }

    #[test]
    fn trailing_blank_without_comment_appends_single_newline() {
        let d = descriptor(FilterSpec {
            trailing_blank: true,
            ..Default::default()
        });
        let outcome = apply(&d.into(), "hostname r1");
        assert_eq!(outcome, PipelineOutcome::Ok("hostname r1\n".to_string()));
    }

    #[test]
    fn trailing_blank_with_comment_appends_comment_line() {
        let d = descriptor(FilterSpec {
            commented: true,
            comment: "! ".to_string(),
            trailing_blank: true,
            ..Default::default()
        });
        let outcome = apply(&d.into(), "hostname r1");
        assert_eq!(
            outcome,
            PipelineOutcome::Ok("! hostname r1\n! \n".to_string())
        );
    }

    #[test]
    fn ignore_takes_priority_over_error_on_same_line() {
        // (a) is evaluated before (b); a line matching both IGNORE and
        // ERROR must short-circuit as Skip, never DeviceError.
        let d = descriptor(FilterSpec {
            ignore: vec!["fatal".to_string()],
            error: vec!["fatal".to_string()],
            ..Default::default()
        });
        let outcome = apply(&d.into(), "fatal: disk full");
        assert!(matches!(outcome, PipelineOutcome::Skip(_)));
    }
}
