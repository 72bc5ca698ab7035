//! Core types for dependency edges and classified results.

use serde::Serialize;
use std::path::PathBuf;

/// Relationship recorded by a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    /// `class A extends B`
    Extends,
    /// `class A implements B`
    Implements,
    /// `use SomeTrait;` inside a class body.
    UsesTrait,
    /// `new B()`
    Instantiates,
    /// `B::method()`
    StaticCall,
    /// `$b->method()` with a statically known receiver.
    InstanceCall,
    /// `B::CONSTANT` (including `B::class`).
    ConstantFetch,
    /// Property type declaration.
    TypeHint,
    /// `catch (B $e)`
    Catch,
    /// Method return type.
    ReturnType,
    /// Method parameter type.
    ParamType,
    /// `$x instanceof B`
    Instanceof,
    /// `#[B]` attribute.
    Attribute,
}

impl ReferenceKind {
    /// Returns the kebab-case name of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extends => "extends",
            Self::Implements => "implements",
            Self::UsesTrait => "uses-trait",
            Self::Instantiates => "instantiates",
            Self::StaticCall => "static-call",
            Self::InstanceCall => "instance-call",
            Self::ConstantFetch => "constant-fetch",
            Self::TypeHint => "type-hint",
            Self::Catch => "catch",
            Self::ReturnType => "return-type",
            Self::ParamType => "param-type",
            Self::Instanceof => "instanceof",
            Self::Attribute => "attribute",
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency edge from one symbol to another.
///
/// The target is kept as the canonical name that was written in source; it
/// may not resolve to any symbol known to the [`AstMap`](crate::AstMap).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Reference {
    /// Fully-qualified name of the depending symbol.
    pub source: String,
    /// Fully-qualified name of the symbol depended upon.
    pub target: String,
    /// Relationship kind.
    pub kind: ReferenceKind,
    /// File declaring the source symbol.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
}

impl Reference {
    /// Creates a new reference.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: ReferenceKind,
        file: impl Into<PathBuf>,
        line: usize,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            file: file.into(),
            line,
        }
    }
}

/// Outcome of checking one edge against the ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// The layer pairing is not allow-listed.
    Violation,
    /// A violation waived through `skip_violations`.
    Skipped,
    /// The target has no layer.
    Uncovered,
    /// The source has no layer, so no rule applies.
    UnclassifiedSource,
    /// Same layer, or allow-listed.
    Allowed,
}

impl Classification {
    /// Returns the kebab-case name of this classification.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Violation => "violation",
            Self::Skipped => "skipped",
            Self::Uncovered => "uncovered",
            Self::UnclassifiedSource => "unclassified-source",
            Self::Allowed => "allowed",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency edge together with the layer pairing it was judged under.
///
/// One edge yields one record per `(source layer, target layer)` pairing, so
/// an edge between multi-layer symbols can be both allowed and a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedEdge {
    /// The triggering edge.
    pub reference: Reference,
    /// Layer of the source symbol this record was judged under.
    pub source_layer: Option<String>,
    /// Layer of the target symbol this record was judged under.
    pub target_layer: Option<String>,
    /// Result.
    pub classification: Classification,
}

impl ClassifiedEdge {
    /// Formats the record for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let r = &self.reference;
        let mut output = format!(
            "{} {} at {}:{}\n",
            self.classification,
            r.kind,
            r.file.display(),
            r.line,
        );
        let _ = write!(output, "  {} -> {}", r.source, r.target);
        match (&self.source_layer, &self.target_layer) {
            (Some(from), Some(to)) => {
                let _ = writeln!(output, " ({from} -> {to})");
            }
            (Some(from), None) => {
                let _ = writeln!(output, " ({from} -> ?)");
            }
            _ => output.push('\n'),
        }
        output
    }
}

impl std::fmt::Display for ClassifiedEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let r = &self.reference;
        write!(
            f,
            "{}:{}: {} [{}] {} -> {}",
            r.file.display(),
            r.line,
            self.classification,
            r.kind,
            r.source,
            r.target,
        )?;
        if let Some(from) = &self.source_layer {
            write!(
                f,
                " ({from} -> {})",
                self.target_layer.as_deref().unwrap_or("?")
            )?;
        }
        Ok(())
    }
}

/// A `skip_violations` entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SkipEntry {
    /// Source symbol.
    pub source: String,
    /// Target symbol.
    pub target: String,
}

/// Record counts per classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Violation records.
    pub violations: usize,
    /// Skipped records.
    pub skipped: usize,
    /// Uncovered records.
    pub uncovered: usize,
    /// Unclassified-source records.
    pub unclassified_source: usize,
    /// Allowed records.
    pub allowed: usize,
    /// Edges dropped by the "ignore uncovered internal classes" flag.
    pub suppressed: usize,
}

/// Result of ruleset evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Every classified record, in stable order.
    pub records: Vec<ClassifiedEdge>,
    /// Edges suppressed without producing a record.
    pub suppressed: usize,
    /// `skip_violations` entries that never matched a violation.
    pub unmatched_skips: Vec<SkipEntry>,
}

impl Report {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns records with the given classification.
    pub fn by_classification(
        &self,
        classification: Classification,
    ) -> impl Iterator<Item = &ClassifiedEdge> {
        self.records
            .iter()
            .filter(move |r| r.classification == classification)
    }

    /// Returns the violation records.
    pub fn violations(&self) -> impl Iterator<Item = &ClassifiedEdge> {
        self.by_classification(Classification::Violation)
    }

    /// Returns the uncovered records.
    pub fn uncovered(&self) -> impl Iterator<Item = &ClassifiedEdge> {
        self.by_classification(Classification::Uncovered)
    }

    /// Returns the skipped records.
    pub fn skipped(&self) -> impl Iterator<Item = &ClassifiedEdge> {
        self.by_classification(Classification::Skipped)
    }

    /// Returns the allowed records.
    pub fn allowed(&self) -> impl Iterator<Item = &ClassifiedEdge> {
        self.by_classification(Classification::Allowed)
    }

    /// Returns true if there are any violations.
    #[must_use]
    pub fn has_violations(&self) -> bool {
        self.violations().next().is_some()
    }

    /// Returns true if the run passes, i.e. no violation was found.
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.has_violations()
    }

    /// Counts records by classification.
    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            suppressed: self.suppressed,
            ..Summary::default()
        };
        for record in &self.records {
            match record.classification {
                Classification::Violation => summary.violations += 1,
                Classification::Skipped => summary.skipped += 1,
                Classification::Uncovered => summary.uncovered += 1,
                Classification::UnclassifiedSource => summary.unclassified_source += 1,
                Classification::Allowed => summary.allowed += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(classification: Classification) -> ClassifiedEdge {
        ClassifiedEdge {
            reference: Reference::new(
                "App\\Controller\\Foo",
                "App\\Repository\\Bar",
                ReferenceKind::InstanceCall,
                "src/Controller/Foo.php",
                12,
            ),
            source_layer: Some("Controller".into()),
            target_layer: Some("Repository".into()),
            classification,
        }
    }

    #[test]
    fn summary_counts_each_classification() {
        let report = Report {
            records: vec![
                record(Classification::Violation),
                record(Classification::Allowed),
                record(Classification::Allowed),
                record(Classification::Skipped),
            ],
            suppressed: 3,
            unmatched_skips: vec![],
        };
        let summary = report.summary();
        assert_eq!(summary.violations, 1);
        assert_eq!(summary.allowed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.uncovered, 0);
        assert_eq!(summary.suppressed, 3);
        assert!(!report.passed());
    }

    #[test]
    fn empty_report_passes() {
        assert!(Report::new().passed());
    }

    #[test]
    fn display_includes_layers() {
        let text = record(Classification::Violation).to_string();
        assert_eq!(
            text,
            "src/Controller/Foo.php:12: violation [instance-call] \
             App\\Controller\\Foo -> App\\Repository\\Bar (Controller -> Repository)"
        );
    }

    #[test]
    fn kinds_serialize_kebab_case() {
        let json = serde_json::to_string(&ReferenceKind::UsesTrait).unwrap();
        assert_eq!(json, "\"uses-trait\"");
        let json = serde_json::to_string(&Classification::UnclassifiedSource).unwrap();
        assert_eq!(json, "\"unclassified-source\"");
    }
}
