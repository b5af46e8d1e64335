//! Wires the extraction stages together for whole documents.

use crate::aggregate::{self, AggregationOptions, Completeness};
use crate::config::ExtractConfig;
use crate::error::GranskaError;
use crate::model::{CandidateRecord, FieldKind, Report, Segment};
use crate::record::RecordBuilder;
use crate::scoring;
use crate::segment;
use crate::strategy::{self, FieldStrategy};
use crate::trace::RunWarning;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Cooperative cancellation flag, checked between segments.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A document to extract: its id and page texts in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub pages: Vec<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, pages: Vec<String>) -> Self {
        Document {
            id: id.into(),
            pages,
        }
    }
}

/// Everything one run over one document produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRun {
    pub document_id: String,
    pub extracted_at: DateTime<Utc>,
    /// Scored candidates of every selected field, grouped by field in
    /// report order, each group in document order.
    pub records: Vec<CandidateRecord>,
    pub warnings: Vec<RunWarning>,
    pub completeness: Completeness,
}

impl ExtractionRun {
    pub fn is_partial(&self) -> bool {
        self.completeness == Completeness::Partial
    }

    /// Aggregate this run's candidates into a report.
    pub fn report(&self, options: &AggregationOptions, generated_at: DateTime<Utc>) -> Report {
        aggregate::build_report(
            &self.document_id,
            &self.records,
            options,
            self.completeness,
            generated_at,
        )
    }
}

/// One field's share of a run.
#[derive(Debug, Default)]
struct FieldOutput {
    records: Vec<CandidateRecord>,
    warnings: Vec<RunWarning>,
    stopped_at: Option<Segment>,
    aborted: bool,
}

type StrategyTable = fn(FieldKind) -> &'static dyn FieldStrategy;

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ExtractConfig,
    cancel: CancelToken,
    strategies: StrategyTable,
}

impl Pipeline {
    pub fn new(config: ExtractConfig) -> Result<Self, GranskaError> {
        config.validate()?;
        Ok(Pipeline {
            config,
            cancel: CancelToken::new(),
            strategies: strategy::for_field,
        })
    }

    #[cfg(test)]
    fn with_strategies(mut self, strategies: StrategyTable) -> Self {
        self.strategies = strategies;
        self
    }

    /// Share an externally owned cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Segment, propose, score and build records for one document.
    ///
    /// Output does not depend on `parallel_strategies`. A cancelled run, or
    /// one whose parallel worker panicked, returns what it had with
    /// `Completeness::Partial` and every record flagged `partial`.
    pub fn run(&self, document_id: &str, pages: &[String], extracted_at: DateTime<Utc>) -> ExtractionRun {
        let builder = RecordBuilder::new(document_id, extracted_at);
        let fields: Vec<FieldKind> = self.config.extract.fields().collect();

        let outputs: Vec<FieldOutput> = if self.config.parallel_strategies && fields.len() > 1 {
            self.run_fields_parallel(&fields, pages, &builder)
        } else {
            fields
                .iter()
                .map(|field| self.run_field(*field, pages, &builder))
                .collect()
        };

        let mut run = ExtractionRun {
            document_id: document_id.to_string(),
            extracted_at,
            records: Vec::new(),
            warnings: Vec::new(),
            completeness: Completeness::Complete,
        };

        let mut first_stop: Option<Segment> = None;
        for output in outputs {
            run.records.extend(output.records);
            run.warnings.extend(output.warnings);
            if output.aborted {
                run.completeness = Completeness::Partial;
            }
            if let Some(segment) = output.stopped_at {
                run.completeness = Completeness::Partial;
                if first_stop.as_ref().map_or(true, |s| segment.ordinal < s.ordinal) {
                    first_stop = Some(segment);
                }
            }
        }
        if let Some(segment) = first_stop {
            run.warnings.push(RunWarning::cancelled(&segment));
        }
        if run.is_partial() {
            for record in &mut run.records {
                record.partial = true;
            }
        }

        tracing::info!(
            document_id,
            records = run.records.len(),
            warnings = run.warnings.len(),
            partial = run.is_partial(),
            "extraction run finished"
        );
        run
    }

    /// Run several documents, fanned out over scoped threads. Results come
    /// back in input order.
    pub fn run_many(&self, documents: &[Document], extracted_at: DateTime<Utc>) -> Vec<ExtractionRun> {
        if documents.is_empty() {
            return Vec::new();
        }
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(documents.len());
        let chunk_size = documents.len().div_ceil(workers);

        thread::scope(|scope| {
            let handles: Vec<_> = documents
                .chunks(chunk_size)
                .map(|chunk| {
                    (
                        chunk,
                        scope.spawn(move || {
                            chunk
                                .iter()
                                .map(|doc| self.run(&doc.id, &doc.pages, extracted_at))
                                .collect::<Vec<_>>()
                        }),
                    )
                })
                .collect();

            let mut runs = Vec::with_capacity(documents.len());
            for (chunk, handle) in handles {
                match handle.join() {
                    Ok(done) => runs.extend(done),
                    Err(_) => {
                        tracing::error!(documents = chunk.len(), "document worker panicked");
                        runs.extend(chunk.iter().map(|doc| aborted_run(&doc.id, extracted_at)));
                    }
                }
            }
            runs
        })
    }

    fn run_fields_parallel(
        &self,
        fields: &[FieldKind],
        pages: &[String],
        builder: &RecordBuilder,
    ) -> Vec<FieldOutput> {
        thread::scope(|scope| {
            let handles: Vec<_> = fields
                .iter()
                .map(|&field| (field, scope.spawn(move || self.run_field(field, pages, builder))))
                .collect();

            handles
                .into_iter()
                .map(|(field, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        tracing::error!(%field, "strategy worker panicked");
                        FieldOutput {
                            warnings: vec![RunWarning::worker_panicked(field)],
                            aborted: true,
                            ..FieldOutput::default()
                        }
                    })
                })
                .collect()
        })
    }

    fn run_field(&self, field: FieldKind, pages: &[String], builder: &RecordBuilder) -> FieldOutput {
        let strategy = (self.strategies)(field);
        let mut out = FieldOutput::default();

        for segment in segment::segments(pages) {
            if self.cancel.is_cancelled() {
                out.stopped_at = Some(segment);
                break;
            }
            match strategy.propose(&segment) {
                Ok(candidates) => {
                    for raw in candidates {
                        let confidence = scoring::score(field, &raw.signals);
                        tracing::debug!(%field, value = %raw.value, confidence, "scored candidate");
                        out.records.push(builder.build(raw, confidence));
                    }
                }
                Err(fault) => {
                    tracing::warn!(%field, page = segment.page, lines = %segment.line_span, %fault, "strategy skipped segment");
                    out.warnings.push(RunWarning::strategy_fault(&segment, field, &fault));
                }
            }
        }
        out
    }
}

fn aborted_run(document_id: &str, extracted_at: DateTime<Utc>) -> ExtractionRun {
    ExtractionRun {
        document_id: document_id.to_string(),
        extracted_at,
        records: Vec::new(),
        warnings: vec![RunWarning::run_aborted()],
        completeness: Completeness::Partial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldSelection;
    use crate::error::StrategyFault;
    use crate::model::RawCandidate;
    use crate::store::{CandidateLog, JsonlCandidateLog};
    use crate::strategy::finding::FindingStrategy;
    use chrono::TimeZone;
    use std::sync::LazyLock;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 8, 30, 0).unwrap()
    }

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    const REPORT: &str = "Social Compliance Audit Report\n\n\
        Factory name: Sunrise Garments Ltd\n\
        Audit date: 2024-03-12\n\
        Lead Auditor: Jane Doe\n\n\
        Findings:\n\
        1. No fire drill records were maintained.\n\
        2. Emergency exits were locked during working hours, a serious violation.\n";

    #[test]
    fn test_records_grouped_by_field_in_report_order() {
        let pipeline = Pipeline::new(ExtractConfig::default()).unwrap();
        let run = pipeline.run("doc", &pages(&[REPORT]), at());
        let fields: Vec<FieldKind> = run.records.iter().map(|r| r.field).collect();
        let mut sorted = fields.clone();
        sorted.sort();
        assert_eq!(fields, sorted);
        assert!(run.records.iter().all(|r| r.extracted_at == at()));
        assert_eq!(run.completeness, Completeness::Complete);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = Pipeline::new(ExtractConfig::default()).unwrap();
        let parallel = Pipeline::new(ExtractConfig {
            parallel_strategies: true,
            ..ExtractConfig::default()
        })
        .unwrap();
        let doc = pages(&[REPORT, "Audited by Beta Audit Co on 1 March 2024."]);
        assert_eq!(sequential.run("d", &doc, at()), parallel.run("d", &doc, at()));
    }

    #[test]
    fn test_field_selection_limits_strategies() {
        let config = ExtractConfig {
            extract: FieldSelection::only([FieldKind::AuditDate]),
            ..ExtractConfig::default()
        };
        let run = Pipeline::new(config).unwrap().run("doc", &pages(&[REPORT]), at());
        assert!(!run.records.is_empty());
        assert!(run.records.iter().all(|r| r.field == FieldKind::AuditDate));
    }

    #[test]
    fn test_cancelled_run_is_partial() {
        let pipeline = Pipeline::new(ExtractConfig::default()).unwrap();
        pipeline.cancel_token().cancel();
        let run = pipeline.run("doc", &pages(&[REPORT]), at());
        assert!(run.is_partial());
        assert!(run.records.is_empty());
        assert_eq!(run.warnings.len(), 1);
        assert!(run.report(&AggregationOptions::default(), at()).partial);
    }

    #[test]
    fn test_run_many_keeps_input_order() {
        let pipeline = Pipeline::new(ExtractConfig::default()).unwrap();
        let docs: Vec<Document> = (0..5)
            .map(|i| Document::new(format!("doc-{i}"), pages(&[REPORT])))
            .collect();
        let runs = pipeline.run_many(&docs, at());
        let ids: Vec<&str> = runs.iter().map(|r| r.document_id.as_str()).collect();
        assert_eq!(ids, vec!["doc-0", "doc-1", "doc-2", "doc-3", "doc-4"]);
        assert_eq!(runs[0].records, {
            let mut r = runs[4].records.clone();
            for rec in &mut r {
                rec.document_id = "doc-0".into();
            }
            r
        });
    }

    #[test]
    fn test_abbreviated_month_dates_survive_segmentation() {
        let pipeline = Pipeline::new(ExtractConfig::default()).unwrap();
        for (text, expected) in [
            ("Audit date: Sept. 14, 2023", "2023-09-14"),
            ("Audit date: Jan. 5, 2024", "2024-01-05"),
            ("Audit date: 14 Sept. 2023", "2023-09-14"),
            ("Audit period: Mar. 2024", "2024-03"),
        ] {
            let run = pipeline.run("doc", &pages(&[text]), at());
            let report = run.report(&AggregationOptions::default(), at());
            let best = report.fields[&FieldKind::AuditDate].best().map(|v| v.value.clone());
            assert_eq!(best.as_deref(), Some(expected), "{text}");
        }
    }

    static MID_RUN: LazyLock<CancelToken> = LazyLock::new(CancelToken::new);

    /// Finding strategy that cancels the run while handling the second segment.
    struct CancelOnSecondSegment;

    impl FieldStrategy for CancelOnSecondSegment {
        fn field(&self) -> FieldKind {
            FieldKind::Finding
        }

        fn propose(&self, segment: &Segment) -> Result<Vec<RawCandidate>, StrategyFault> {
            if segment.ordinal == 1 {
                MID_RUN.cancel();
            }
            FindingStrategy.propose(segment)
        }
    }

    fn cancelling(_: FieldKind) -> &'static dyn FieldStrategy {
        &CancelOnSecondSegment
    }

    struct Exploding;

    impl FieldStrategy for Exploding {
        fn field(&self) -> FieldKind {
            FieldKind::Finding
        }

        fn propose(&self, _segment: &Segment) -> Result<Vec<RawCandidate>, StrategyFault> {
            panic!("strategy bug")
        }
    }

    fn exploding_findings(field: FieldKind) -> &'static dyn FieldStrategy {
        match field {
            FieldKind::Finding => &Exploding,
            other => strategy::for_field(other),
        }
    }

    #[test]
    fn test_cancel_mid_run_keeps_processed_segments() {
        let config = ExtractConfig {
            extract: FieldSelection::only([FieldKind::Finding]),
            ..ExtractConfig::default()
        };
        let pipeline = Pipeline::new(config)
            .unwrap()
            .with_strategies(cancelling)
            .with_cancel_token(MID_RUN.clone());
        let doc = pages(&["1. No fire drill records were maintained.\n\
             2. Emergency exits were locked, a serious violation.\n\
             3. Workers were not provided with protective equipment."]);

        let run = pipeline.run("doc", &doc, at());
        assert!(run.is_partial());
        assert_eq!(run.records.len(), 2);
        assert!(run.records.iter().all(|r| r.partial));
        assert_eq!(run.warnings.len(), 1);
        assert_eq!(run.warnings[0].page(), Some(1));
        assert_eq!(run.warnings[0].location.map(|l| l.line_span.start), Some(3));

        // The partial mark survives a trip through the log.
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlCandidateLog::new(dir.path().join("doc.candidates.jsonl"));
        log.append(&run.records).unwrap();
        let back = log.read_document("doc").unwrap();
        let rebuilt = aggregate::build_report(
            "doc",
            &back,
            &AggregationOptions::default(),
            Completeness::Complete,
            at(),
        );
        assert!(rebuilt.partial);
        assert!(rebuilt.fields.values().all(|f| f.partial));
        assert_eq!(rebuilt.fields[&FieldKind::Finding].selected_values.len(), 2);
    }

    #[test]
    fn test_panicked_worker_is_reported() {
        let pipeline = Pipeline::new(ExtractConfig {
            parallel_strategies: true,
            ..ExtractConfig::default()
        })
        .unwrap()
        .with_strategies(exploding_findings);

        let run = pipeline.run("doc", &pages(&[REPORT]), at());
        assert!(run.is_partial());
        assert!(run.records.iter().all(|r| r.field != FieldKind::Finding && r.partial));
        assert!(run.records.iter().any(|r| r.field == FieldKind::AuditDate));
        assert_eq!(run.warnings, vec![RunWarning::worker_panicked(FieldKind::Finding)]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExtractConfig {
            min_confidence: -0.1,
            ..ExtractConfig::default()
        };
        assert!(Pipeline::new(config).is_err());
    }
}
