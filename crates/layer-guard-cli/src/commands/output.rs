//! Shared output formatting for analysis results.

use anyhow::Result;
use layer_guard_core::{Analysis, Classification, ClassifiedEdge, SkipEntry, Summary};
use serde::Serialize;

use super::check::CheckOptions;
use crate::OutputFormat;

/// Print analysis results in the requested format.
pub fn print(analysis: &Analysis, options: CheckOptions) -> Result<()> {
    match options.format {
        OutputFormat::Text => print_text(analysis, options),
        OutputFormat::Json => print_json(analysis, options)?,
        OutputFormat::Compact => print_compact(analysis, options),
    }
    Ok(())
}

/// Classifications listed for the given switches, in output order.
fn listed(options: CheckOptions) -> Vec<Classification> {
    let mut listed = vec![Classification::Violation, Classification::Skipped];
    if options.report_uncovered {
        listed.push(Classification::Uncovered);
        listed.push(Classification::UnclassifiedSource);
    }
    if options.report_allowed {
        listed.push(Classification::Allowed);
    }
    listed
}

fn print_text(analysis: &Analysis, options: CheckOptions) {
    let report = &analysis.report;

    for classification in listed(options) {
        for record in report.by_classification(classification) {
            println!("{}", record.format());
        }
    }

    for skip in &report.unmatched_skips {
        println!(
            "\x1b[33mwarning\x1b[0m: skip_violations entry {} -> {} matched nothing",
            skip.source, skip.target
        );
    }
    for failure in &analysis.failures {
        println!("\x1b[33mwarning\x1b[0m: {failure}");
    }

    let summary = report.summary();
    let summary_color = if summary.violations > 0 {
        "\x1b[31m"
    } else if summary.uncovered > 0 && options.fail_on_uncovered {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} violation(s), {} skipped, {} uncovered, {} allowed in {} file(s)\x1b[0m",
        summary_color,
        summary.violations,
        summary.skipped,
        summary.uncovered,
        summary.allowed,
        analysis.files_analyzed
    );
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: Summary,
    files_analyzed: usize,
    violations: Vec<&'a ClassifiedEdge>,
    skipped: Vec<&'a ClassifiedEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uncovered: Option<Vec<&'a ClassifiedEdge>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed: Option<Vec<&'a ClassifiedEdge>>,
    unmatched_skips: &'a [SkipEntry],
    failures: Vec<String>,
}

fn print_json(analysis: &Analysis, options: CheckOptions) -> Result<()> {
    let report = &analysis.report;
    let json = JsonReport {
        summary: report.summary(),
        files_analyzed: analysis.files_analyzed,
        violations: report.violations().collect(),
        skipped: report.skipped().collect(),
        uncovered: options.report_uncovered.then(|| {
            report
                .by_classification(Classification::Uncovered)
                .chain(report.by_classification(Classification::UnclassifiedSource))
                .collect()
        }),
        allowed: options
            .report_allowed
            .then(|| report.allowed().collect()),
        unmatched_skips: &report.unmatched_skips,
        failures: analysis.failures.iter().map(ToString::to_string).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_compact(analysis: &Analysis, options: CheckOptions) {
    for classification in listed(options) {
        for record in analysis.report.by_classification(classification) {
            println!("{record}");
        }
    }
}
