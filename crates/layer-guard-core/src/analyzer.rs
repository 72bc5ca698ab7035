//! Pipeline orchestration: extraction, layer resolution, ruleset evaluation.

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::ast::{
    AstMap, ExtractionError, ExtractionPolicy, Extractor, ParsedFile, ResolverRegistry,
};
use crate::collector::CollectorRegistry;
use crate::config::{Configuration, ConfigurationError};
use crate::layer::{LayerMembership, LayerResolver};
use crate::ruleset::RulesetEngine;
use crate::types::Report;

/// Errors that abort an analysis run.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A file failed under fail-fast.
    #[error("Extraction error: {0}")]
    Extraction(ExtractionError),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    configuration: Option<Configuration>,
    raw_configuration: Option<Value>,
    collectors: Option<CollectorRegistry>,
    resolvers: Option<ResolverRegistry>,
    fail_fast: bool,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an already validated configuration.
    #[must_use]
    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(configuration);
        self.raw_configuration = None;
        self
    }

    /// Sets a raw configuration tree, validated in [`AnalyzerBuilder::build`].
    #[must_use]
    pub fn raw_configuration(mut self, value: Value) -> Self {
        self.raw_configuration = Some(value);
        self.configuration = None;
        self
    }

    /// Sets the collector kinds available to a raw configuration.
    #[must_use]
    pub fn collector_registry(mut self, registry: CollectorRegistry) -> Self {
        self.collectors = Some(registry);
        self
    }

    /// Sets the reference resolvers (default: all built-in resolvers).
    #[must_use]
    pub fn resolvers(mut self, resolvers: ResolverRegistry) -> Self {
        self.resolvers = Some(resolvers);
        self
    }

    /// Sets whether the first file failure aborts the run (default: false).
    #[must_use]
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the raw configuration does not validate.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let configuration = match (self.configuration, self.raw_configuration) {
            (Some(configuration), _) => configuration,
            (None, Some(raw)) => {
                let registry = self.collectors.unwrap_or_default();
                Configuration::from_value_with(&raw, &registry)?
            }
            (None, None) => Configuration::default(),
        };

        Ok(Analyzer {
            configuration,
            extractor: Extractor::new(
                self.resolvers.unwrap_or_default(),
                ExtractionPolicy {
                    fail_fast: self.fail_fast,
                },
            ),
        })
    }
}

/// Everything a run produced.
#[derive(Debug)]
pub struct Analysis {
    /// Symbol index and dependency graph.
    pub ast_map: AstMap,
    /// Layers of every classified symbol.
    pub membership: LayerMembership,
    /// Classified edges.
    pub report: Report,
    /// Files skipped because they could not be extracted.
    pub failures: Vec<ExtractionError>,
    /// Number of files merged into the map.
    pub files_analyzed: usize,
}

impl Analysis {
    /// Returns true if no violation was found.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.report.passed()
    }
}

/// Runs the three pipeline stages over a closed file set.
///
/// Use [`Analyzer::builder()`] to construct an instance.
#[derive(Debug)]
pub struct Analyzer {
    configuration: Configuration,
    extractor: Extractor,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// The validated configuration.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Analyzes the given parser outputs.
    ///
    /// Failed files are skipped with a warning unless fail-fast is set.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::Extraction`] for the first failure in input
    /// order under fail-fast.
    pub fn analyze(
        &self,
        files: Vec<Result<ParsedFile, ExtractionError>>,
    ) -> Result<Analysis, AnalyzerError> {
        info!(
            files = files.len(),
            layers = self.configuration.layers().len(),
            "starting analysis"
        );

        let outcome = self
            .extractor
            .extract_all(files)
            .map_err(AnalyzerError::Extraction)?;
        let membership = LayerResolver::new(&self.configuration).resolve(&outcome.ast_map);
        let report = RulesetEngine::new(self.configuration.ruleset())
            .evaluate(&outcome.ast_map, &membership);

        let summary = report.summary();
        info!(
            symbols = outcome.ast_map.len(),
            references = outcome.ast_map.reference_count(),
            violations = summary.violations,
            uncovered = summary.uncovered,
            failures = outcome.failures.len(),
            "analysis complete"
        );

        Ok(Analysis {
            ast_map: outcome.ast_map,
            membership,
            report,
            failures: outcome.failures,
            files_analyzed: outcome.files_extracted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SyntaxNode;
    use serde_json::json;

    #[test]
    fn invalid_raw_configuration_fails_build() {
        let error = Analyzer::builder()
            .raw_configuration(json!({ "layers": [{ "name": "A" }, { "name": "A" }] }))
            .build()
            .unwrap_err();
        assert!(matches!(error, AnalyzerError::Configuration(_)));
    }

    #[test]
    fn empty_input_passes() {
        let analysis = Analyzer::builder().build().unwrap().analyze(vec![]).unwrap();
        assert!(analysis.passed());
        assert_eq!(analysis.files_analyzed, 0);
    }

    #[test]
    fn fail_fast_aborts() {
        let files = vec![
            Ok(ParsedFile::new("ok.php", SyntaxNode::block(1, vec![]))),
            Err(ExtractionError::Parse {
                path: "broken.php".into(),
                message: "syntax error".into(),
            }),
        ];
        let error = Analyzer::builder()
            .fail_fast(true)
            .build()
            .unwrap()
            .analyze(files)
            .unwrap_err();
        assert!(matches!(error, AnalyzerError::Extraction(ExtractionError::Parse { .. })));
    }
}
