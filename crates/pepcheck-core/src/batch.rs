//! Summarization batch runner.
//!
//! Every section is summarized independently. A failure is recorded on that
//! section's [`SectionOutcome`] and never escapes it, so one bad section
//! cannot block the rest of the record. Output always has the input's length
//! and order.

use completion_client::CompletionService;
use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tracing::instrument;

use crate::config::SummarizerConfig;
use crate::domain::{Record, Result, Section, SummarizeError};
use crate::obs;
use crate::summarizer::summarize_section;

/// What happened to one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionOutcome {
    /// Copy of the input with `plain_language_summary` set.
    Summarized(Section),
    /// The input, unchanged, plus the failure reason.
    Failed { section: Section, reason: String },
    /// The input, unchanged; the batch was cancelled before it finished.
    Skipped(Section),
}

impl SectionOutcome {
    pub fn section(&self) -> &Section {
        match self {
            SectionOutcome::Summarized(s) | SectionOutcome::Skipped(s) => s,
            SectionOutcome::Failed { section, .. } => section,
        }
    }

    pub fn into_section(self) -> Section {
        match self {
            SectionOutcome::Summarized(s) | SectionOutcome::Skipped(s) => s,
            SectionOutcome::Failed { section, .. } => section,
        }
    }

    pub fn is_summarized(&self) -> bool {
        matches!(self, SectionOutcome::Summarized(_))
    }
}

/// Ordered per-section outcomes of one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<SectionOutcome>,
}

impl BatchReport {
    pub fn summarized_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_summarized()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, SectionOutcome::Failed { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, SectionOutcome::Skipped(_)))
            .count()
    }

    /// `(title, reason)` for each failed section, in order.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                SectionOutcome::Failed { section, reason } => {
                    Some((section.title.as_str(), reason.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn into_sections(self) -> Vec<Section> {
        self.outcomes
            .into_iter()
            .map(SectionOutcome::into_section)
            .collect()
    }
}

/// Runs the section summarizer over a batch.
///
/// Sequential unless `SummarizerConfig::concurrency` is above one; ordered
/// buffering keeps output order either way.
pub struct BatchRunner<'a> {
    service: &'a dyn CompletionService,
    cancel: Option<watch::Receiver<bool>>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(service: &'a dyn CompletionService) -> Self {
        Self {
            service,
            cancel: None,
        }
    }

    /// Abandon in-flight and pending sections once `cancel` reads `true`.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[instrument(skip(self, sections, config), fields(sections = sections.len(), concurrency = config.concurrency))]
    pub async fn run(
        &self,
        sections: &[Section],
        subject_name: &str,
        config: &SummarizerConfig,
    ) -> BatchReport {
        let outcomes: Vec<SectionOutcome> = stream::iter(sections.iter().enumerate())
            .map(|(index, section)| self.summarize_one(index, section, subject_name, config))
            .buffered(config.concurrency.max(1))
            .collect()
            .await;

        let report = BatchReport { outcomes };
        obs::emit_batch_finished(
            subject_name,
            report.summarized_count(),
            report.failed_count(),
            report.skipped_count(),
        );
        report
    }

    async fn summarize_one(
        &self,
        index: usize,
        section: &Section,
        subject_name: &str,
        config: &SummarizerConfig,
    ) -> SectionOutcome {
        let call = summarize_section(
            self.service,
            &section.title,
            &section.content_html,
            subject_name,
            config,
        );

        let result = match &self.cancel {
            None => call.await,
            Some(cancel) => {
                if *cancel.borrow() {
                    return SectionOutcome::Skipped(section.clone());
                }
                let mut cancel = cancel.clone();
                tokio::select! {
                    result = call => result,
                    _ = wait_for_cancel(&mut cancel) => {
                        return SectionOutcome::Skipped(section.clone());
                    }
                }
            }
        };

        settle(index, section, result)
    }
}

fn settle(
    index: usize,
    section: &Section,
    result: std::result::Result<String, SummarizeError>,
) -> SectionOutcome {
    match result {
        Ok(summary) => SectionOutcome::Summarized(section.with_summary(summary)),
        Err(err) => {
            obs::emit_section_failed(&section.title, index, &err);
            SectionOutcome::Failed {
                section: section.clone(),
                reason: err.to_string(),
            }
        }
    }
}

async fn wait_for_cancel(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        // sender dropped without cancelling
        std::future::pending::<()>().await;
    }
}

/// Summarize every section, returning sections in input order.
///
/// Failed sections come back unchanged (no summary).
pub async fn summarize_all(
    service: &dyn CompletionService,
    sections: &[Section],
    subject_name: &str,
    config: &SummarizerConfig,
) -> Vec<Section> {
    BatchRunner::new(service)
        .run(sections, subject_name, config)
        .await
        .into_sections()
}

/// Validate `record`, then return a copy with section summaries attached.
pub async fn summarize_record(
    service: &dyn CompletionService,
    record: &Record,
    config: &SummarizerConfig,
) -> Result<(Record, BatchReport)> {
    record.validate()?;
    let report = BatchRunner::new(service)
        .run(&record.sections, &record.name, config)
        .await;
    let updated = Record {
        name: record.name.clone(),
        summary_html: record.summary_html.clone(),
        sections: report.clone().into_sections(),
    };
    Ok((updated, report))
}
