//! Plain-language rewriting of a single section.

use std::sync::OnceLock;

use completion_client::{CompletionRequest, CompletionService};
use regex::Regex;
use tracing::{debug, instrument};

use crate::config::SummarizerConfig;
use crate::domain::SummarizeError;

/// Appended when prose is cut to the configured maximum.
pub const TRUNCATION_MARKER: &str = "...";

/// System prompt for the rewriter.
pub const SUMMARY_RUBRIC: &str = "You rewrite technical research writing about peptides for a general audience.

Rules:
- Write at an 8th-grade reading level.
- Use 2-3 sentences.
- Avoid jargon; if a technical term is unavoidable, explain it in plain words.
- Explain why the information matters in practical terms.
- Use active voice and present tense.
- Do not give medical advice, doses or product recommendations.
- Output ONLY the summary text: no labels, no headings, no quotation marks, no markdown.";

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

fn whitespace_regex() -> &'static Regex {
    static WS: OnceLock<Regex> = OnceLock::new();
    WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Replace tags with a space, decode common entities and collapse whitespace.
pub fn strip_markup(html: &str) -> String {
    let without_tags = tag_regex().replace_all(html, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    whitespace_regex().replace_all(&decoded, " ").trim().to_string()
}

/// Cut `text` to `max_chars` characters, marking the cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
    }
}

/// Prose actually sent to the rewriter: stripped first, then truncated.
pub fn prepare_section_text(content_html: &str, max_chars: usize) -> String {
    truncate_chars(&strip_markup(content_html), max_chars)
}

/// Build the rewriter's user prompt.
pub fn render_summary_prompt(title: &str, subject_name: &str, prose: &str) -> String {
    format!(
        "Peptide: {subject_name}\nSection: {title}\n\nRewrite this section in plain language:\n\n{prose}"
    )
}

/// Produce an accessible summary of one section.
///
/// Returns the trimmed model output; the caller decides where to attach it.
#[instrument(skip(service, content_html, config))]
pub async fn summarize_section(
    service: &dyn CompletionService,
    title: &str,
    content_html: &str,
    subject_name: &str,
    config: &SummarizerConfig,
) -> Result<String, SummarizeError> {
    let prose = prepare_section_text(content_html, config.max_chars);
    if prose.is_empty() {
        return Err(SummarizeError::EmptyContent);
    }

    let request = CompletionRequest::new(
        SUMMARY_RUBRIC,
        render_summary_prompt(title, subject_name, &prose),
        config.max_tokens,
        config.temperature,
    );
    let response = service.complete(&config.completion, &request).await?;

    let summary = response.content.trim();
    if summary.is_empty() {
        return Err(SummarizeError::EmptyResponse);
    }
    debug!(chars = summary.chars().count(), "section summarized");
    Ok(summary.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use completion_client::fakes::ScriptedCompletionService;
    use completion_client::{CompletionConfig, CompletionError};

    fn config() -> SummarizerConfig {
        SummarizerConfig::new(CompletionConfig::new("sk-test", "test-model"))
    }

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        assert_eq!(
            strip_markup("<p>Studies   show <b>X</b>.</p>\n<p>More&nbsp;text &amp; data</p>"),
            "Studies show X . More text & data"
        );
        assert_eq!(strip_markup("<br/><div>  </div>"), "");
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("abcdef", 6), "abcdef");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("ééééé", 2), "éé...");
    }

    #[test]
    fn truncation_happens_after_stripping() {
        let html = format!("<p>{}</p>", "a".repeat(10));
        // cutting before stripping would spend the budget on markup
        assert_eq!(prepare_section_text(&html, 10), "a".repeat(10));
        let long = format!("<div class=\"x\">{}</div>", "b".repeat(3500));
        let prepared = prepare_section_text(&long, 3000);
        assert_eq!(prepared.chars().count(), 3000 + TRUNCATION_MARKER.len());
        assert!(prepared.ends_with(TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn returns_trimmed_response_and_sends_prose() {
        let service = ScriptedCompletionService::new().respond("  This peptide helps tissue repair in animals.\n");
        let summary = summarize_section(
            &service,
            "Mechanism",
            "<p>Upregulates <em>VEGF</em> expression.</p>",
            "BPC-157",
            &config(),
        )
        .await
        .unwrap();
        assert_eq!(summary, "This peptide helps tissue repair in animals.");

        let requests = service.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].user_prompt.contains("Upregulates VEGF expression."));
        assert!(!requests[0].user_prompt.contains("<em>"));
        assert!(requests[0].user_prompt.contains("Peptide: BPC-157"));
        assert!(requests[0].user_prompt.contains("Section: Mechanism"));
        assert_eq!(requests[0].system_prompt, SUMMARY_RUBRIC);
    }

    #[tokio::test]
    async fn empty_content_skips_remote_call() {
        let service = ScriptedCompletionService::new().respond("unused");
        let err = summarize_section(&service, "Empty", "<p> </p>", "BPC-157", &config())
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizeError::EmptyContent));
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn blank_response_and_transport_errors_fail() {
        let service = ScriptedCompletionService::new()
            .respond("   ")
            .fail(CompletionError::Transport("reset".into()));
        let first = summarize_section(&service, "A", "<p>x</p>", "P", &config()).await;
        assert!(matches!(first, Err(SummarizeError::EmptyResponse)));
        let second = summarize_section(&service, "A", "<p>x</p>", "P", &config()).await;
        assert!(matches!(second, Err(SummarizeError::Completion(_))));
    }
}
