#![deny(missing_docs)]
//! Pipeline orchestrator: `load -> instantiate -> learn -> prune`.
//!
//! Wires the other `lss-*` crates into the single entry point
//! `synthesize` — one function per stage, threaded through a single
//! `SynthesisOptions`.

use lss_core::{Candidate, Conformance, Constraint, Rational, Result, Views};
use lss_io::{build_output, load, OutputDocument, PruningMethod, SynthesisOptions};
use lss_smt::{prune, PruneConfig, PruneRequest};

/// Per-stage counts surfaced alongside the pruned constraint set, structured
/// the way a run summary sits next to its artefacts rather than relying on
/// stray `println!`s.
#[derive(Debug, Clone, Default)]
pub struct SynthesisReport {
    /// Number of examples the pipeline was given.
    pub example_count: usize,
    /// Number of template shapes the instantiator emitted.
    pub template_count: usize,
    /// Number of concrete, scored candidates the learner produced (summed
    /// across all templates).
    pub candidate_count: usize,
    /// Number of constraints the pruner selected.
    pub selected_count: usize,
}

/// Full result of one `synthesize` call: the output document plus the
/// report of what each stage produced.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// The constraints/valuations output JSON document.
    pub output: OutputDocument,
    /// Per-stage counts for diagnostics.
    pub report: SynthesisReport,
}

fn prune_config_from_options(options: &SynthesisOptions) -> PruneConfig {
    PruneConfig {
        unambig: options.unambig,
        determinism: options.determinism,
        ambiguity_iteration_cap: options.ambiguity_iteration_cap,
        combine_bounds_tolerance: options.combine_bounds_tolerance.clone(),
        conformance_samples: options.conformance_samples,
    }
}

fn learn_candidates(templates: &[Constraint], examples: &[Views], options: &SynthesisOptions) -> Result<Vec<Candidate>> {
    let mut cfg = lss_learn::LearnConfig::default();
    if options.learning_method == lss_io::LearningMethodOption::Noisetolerant {
        cfg.min_sample_count = examples.len() as u32;
        cfg.max_offset = max_offset_bound(examples);
    }
    let learned = lss_learn::learn(templates, examples, &cfg, options.learning_method.into())?;
    Ok(learned.into_iter().flatten().collect())
}

/// `max(width, height)` across every example, plus ten: sizes the
/// noise-tolerant learner's offset-rejection bound off the observed
/// layout scale rather than a fixed constant.
fn max_offset_bound(examples: &[Views]) -> Rational {
    use num_bigint::BigInt;
    let mut bound = Rational::from_integer(BigInt::from(0));
    for views in examples {
        let rect = views.rect(views.root());
        let w = rect.width();
        let h = rect.height();
        if w > bound {
            bound = w;
        }
        if h > bound {
            bound = h;
        }
    }
    bound + Rational::from_integer(BigInt::from(10))
}

fn baseline_prune(reference: &Views, examples: &[Views], candidates: &[Candidate], options: &SynthesisOptions) -> Result<(Vec<Constraint>, std::collections::BTreeMap<String, Rational>, std::collections::BTreeMap<String, Rational>)> {
    let (lo, hi) = lss_hierarchy::root_conformance_bounds(examples);
    let focus = reference.root();
    let relevant = lss_hierarchy::relevant_candidates(reference, focus, candidates);
    let request = PruneRequest { views: reference, focus, candidates: &relevant, lo, hi };
    let output = prune(&request, &prune_config_from_options(options))?;
    Ok((output.selected, output.min_vals, output.max_vals))
}

/// Runs the full four-stage pipeline over a parsed input document,
/// producing the output JSON document plus a diagnostic report.
pub fn synthesize(input_json: &str, options: &SynthesisOptions) -> Result<SynthesisResult> {
    log::info!("running synthesis with options: {options:?}");

    let examples = load(input_json, options)?;
    let reference = &examples[0];

    if options.instantiation_method == lss_io::InstantiationMethod::Prolog {
        return Err(lss_core::Error::unsupported(
            "prolog_instantiation_unsupported",
            "instantiation_method = prolog names a legacy alternate instantiator, which this implementation does not provide",
        ));
    }

    let templates = lss_template::instantiate(&examples)?;
    let candidates = learn_candidates(&templates, &examples, options)?;

    let pruned = match options.pruning_method {
        PruningMethod::Baseline => baseline_prune(reference, &examples, &candidates, options),
        PruningMethod::Hierarchical => {
            let config = lss_hierarchy::HierarchyConfig { prune: prune_config_from_options(options), integrate: options.integrate };
            lss_hierarchy::synthesize(reference, &examples, &candidates, &config)
                .map(|output| (output.constraints, output.min_vals, output.max_vals))
        }
    };
    let (selected, min_vals, max_vals) = match pruned {
        Ok(ok) => ok,
        Err(err) => {
            if let (Some(path), lss_core::Error::Infeasible(_, conflict)) = (&options.conflict_dump_path, &err) {
                dump_conflict(path, conflict);
            }
            return Err(err);
        }
    };

    let report = SynthesisReport {
        example_count: examples.len(),
        template_count: templates.len(),
        candidate_count: candidates.len(),
        selected_count: selected.len(),
    };
    let output = build_output(&selected, &min_vals, &max_vals);
    Ok(SynthesisResult { output, report })
}

/// Dumps a [`lss_core::ConflictReport`] to `path` as pretty JSON, best
/// effort (never fails the caller — diagnostics should not mask the
/// original error). Wired in by callers that set
/// `SynthesisOptions::conflict_dump_path` and want the unsat core on disk.
pub fn dump_conflict(path: &std::path::Path, report: &lss_core::ConflictReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => {
            if let Err(err) = std::fs::write(path, json) {
                log::warn!("failed to write conflict dump to {}: {err}", path.display());
            }
        }
        Err(err) => log::warn!("failed to serialize conflict report: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_child_json(widths: &[i64]) -> String {
        let examples: Vec<String> = widths
            .iter()
            .map(|w| {
                format!(
                    r#"{{"name": "root", "rect": [0,0,{w},100], "children": [
                        {{"name": "child", "rect": [10,10,60,60], "children": []}}
                    ]}}"#
                )
            })
            .collect();
        format!(r#"{{"examples": [{}]}}"#, examples.join(","))
    }

    #[test]
    fn synthesizes_fixed_child_end_to_end() {
        let json = fixed_child_json(&[100, 200, 300]);
        let options = SynthesisOptions::default();
        let result = synthesize(&json, &options).unwrap();

        assert_eq!(result.report.example_count, 3);
        assert!(result.report.selected_count > 0);
        assert!(result.output.constraints.iter().any(|c| c.kind == "size_constant" && c.y == "child.width"));
    }

    #[test]
    fn baseline_and_hierarchical_agree_on_child_size() {
        let json = fixed_child_json(&[100, 300]);
        let mut baseline = SynthesisOptions::default();
        baseline.pruning_method = PruningMethod::Baseline;
        let mut hierarchical = SynthesisOptions::default();
        hierarchical.pruning_method = PruningMethod::Hierarchical;

        let baseline_result = synthesize(&json, &baseline).unwrap();
        let hierarchical_result = synthesize(&json, &hierarchical).unwrap();

        let width_const = |doc: &OutputDocument| {
            doc.constraints
                .iter()
                .find(|c| c.kind == "size_constant" && c.y == "child.width")
                .and_then(|c| c.b.clone())
        };
        assert_eq!(width_const(&baseline_result.output), width_const(&hierarchical_result.output));
    }

    #[test]
    fn prolog_instantiation_is_unsupported() {
        let json = fixed_child_json(&[100, 200]);
        let mut options = SynthesisOptions::default();
        options.instantiation_method = lss_io::InstantiationMethod::Prolog;
        let err = synthesize(&json, &options).unwrap_err();
        assert!(matches!(err, lss_core::Error::Unsupported(_)));
    }

    #[test]
    fn degenerate_single_example_does_not_raise_learning_errors() {
        let json = fixed_child_json(&[100]);
        let options = SynthesisOptions::default();
        let result = synthesize(&json, &options).unwrap();
        assert!(result.report.selected_count > 0);
    }

    #[test]
    fn dump_conflict_writes_pretty_json_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conflict.json");
        let report = lss_core::ConflictReport {
            focus_view: "child".to_string(),
            axis: "horizontal".to_string(),
            conflicting_constraints: vec!["child.width = 50".to_string(), "child.width = 60".to_string()],
        };

        dump_conflict(&path, &report);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"focus_view\": \"child\""));
        assert!(written.contains("child.width = 50"));
    }
}
