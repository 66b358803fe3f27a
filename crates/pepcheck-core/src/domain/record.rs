//! Content records submitted for summarization and review.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::{ComplianceError, Result};

/// One titled content block within a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    pub content_html: String,
    /// Accessible rewrite of `content_html`; only the summarizer sets it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_language_summary: Option<String>,
}

impl Section {
    pub fn new(title: impl Into<String>, content_html: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content_html: content_html.into(),
            plain_language_summary: None,
        }
    }

    /// Copy of this section carrying `summary`.
    pub fn with_summary(&self, summary: impl Into<String>) -> Self {
        Self {
            plain_language_summary: Some(summary.into()),
            ..self.clone()
        }
    }
}

/// The full content unit for one subject peptide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub name: String,
    pub summary_html: String,
    pub sections: Vec<Section>,
}

impl Record {
    pub fn new(name: impl Into<String>, summary_html: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            summary_html: summary_html.into(),
            sections: Vec::new(),
        }
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Reject records missing required fields before any remote call.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ComplianceError::InvalidRecord(
                "record name must not be empty".to_string(),
            ));
        }
        for (idx, section) in self.sections.iter().enumerate() {
            if section.title.trim().is_empty() {
                return Err(ComplianceError::InvalidRecord(format!(
                    "section {} has an empty title",
                    idx
                )));
            }
        }
        Ok(())
    }

    /// Summary followed by every section body, blank-line separated.
    pub fn full_text(&self) -> String {
        let mut parts = Vec::with_capacity(self.sections.len() + 1);
        parts.push(self.summary_html.as_str());
        parts.extend(self.sections.iter().map(|s| s.content_html.as_str()));
        parts.join("\n\n")
    }

    /// SHA-256 hex digest of the canonical JSON form.
    pub fn digest(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&json)))
    }

    /// Parse a record from JSON, then validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let record: Record = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record::new("BPC-157", "<p>A synthetic peptide.</p>")
            .with_section(Section::new("Mechanism", "<p>Binds receptors.</p>"))
            .with_section(Section::new("Research", "<p>Animal data only.</p>"))
    }

    #[test]
    fn full_text_joins_summary_and_bodies() {
        let text = sample().full_text();
        assert_eq!(
            text,
            "<p>A synthetic peptide.</p>\n\n<p>Binds receptors.</p>\n\n<p>Animal data only.</p>"
        );
    }

    #[test]
    fn validate_rejects_blank_name_and_titles() {
        assert!(sample().validate().is_ok());

        let mut no_name = sample();
        no_name.name = "   ".to_string();
        assert!(matches!(
            no_name.validate(),
            Err(ComplianceError::InvalidRecord(_))
        ));

        let blank_title = sample().with_section(Section::new("", "body"));
        let err = blank_title.validate().unwrap_err();
        assert!(err.to_string().contains("section 2"));
    }

    #[test]
    fn camel_case_wire_format() {
        let json = serde_json::to_value(sample().sections[0].with_summary("Easy words.")).unwrap();
        assert_eq!(json["contentHtml"], "<p>Binds receptors.</p>");
        assert_eq!(json["plainLanguageSummary"], "Easy words.");

        let without = serde_json::to_value(&sample().sections[0]).unwrap();
        assert!(without.get("plainLanguageSummary").is_none());
    }

    #[test]
    fn from_json_requires_fields() {
        assert!(Record::from_json(r#"{"name":"X","sections":[]}"#).is_err());
        let ok = Record::from_json(r#"{"name":"X","summaryHtml":"","sections":[]}"#).unwrap();
        assert_eq!(ok.name, "X");
    }

    #[test]
    fn digest_tracks_content() {
        let a = sample();
        let mut b = sample();
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
        b.sections[0].content_html.push('!');
        assert_ne!(a.digest().unwrap(), b.digest().unwrap());
        assert_eq!(a.digest().unwrap().len(), 64);
    }
}
