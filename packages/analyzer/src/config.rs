//! Configuration constants and runtime analysis settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AnalyzerError, Result};

/// Tag of the document root element.
pub const ROOT_TAG: &str = "Law";

/// Top-level provisions directly below the law body.
pub const TOPLEVEL_CONTAINER_TAGS: &[&str] = &[
    "Preamble",
    "EnactStatement",
    "MainProvision",
    "SupplProvision",
    "AppdxTable",
    "AppdxStyle",
    "AppdxNote",
    "AppdxFormat",
    "AppdxFig",
    "Appdx",
];

/// Pure grouping levels. They are skipped in the "sub" container hierarchy.
pub const ARTICLES_CONTAINER_TAGS: &[&str] = &["Part", "Chapter", "Section", "Subsection", "Division"];

/// Containers that directly own sentences.
pub const SPANS_CONTAINER_TAGS: &[&str] = &[
    "Article",
    "Paragraph",
    "Item",
    "Subitem1",
    "Subitem2",
    "Subitem3",
    "Subitem4",
    "Subitem5",
    "Subitem6",
    "Subitem7",
    "Subitem8",
    "Subitem9",
    "Subitem10",
    "Table",
    "TableRow",
    "TableColumn",
];

/// Elements never descended into during span extraction.
///
/// Titles, captions and numbers are labels rather than provisions, and
/// supplementary provisions are analyzed apart from the main text.
pub const IGNORE_SPAN_TAGS: &[&str] = &[
    "LawNum",
    "LawTitle",
    "TOC",
    "PartTitle",
    "ChapterTitle",
    "SectionTitle",
    "SubsectionTitle",
    "DivisionTitle",
    "ArticleTitle",
    "ArticleCaption",
    "ParagraphNum",
    "ParagraphCaption",
    "ItemTitle",
    "Subitem1Title",
    "Subitem2Title",
    "Subitem3Title",
    "Subitem4Title",
    "Subitem5Title",
    "Subitem6Title",
    "Subitem7Title",
    "Subitem8Title",
    "Subitem9Title",
    "Subitem10Title",
    "SupplProvisionLabel",
    "AppdxTableTitle",
    "SupplProvision",
];

/// Elements that always form a span, even when all of their text has been
/// wrapped into annotation nodes.
pub const SPAN_TAGS: &[&str] = &[
    "Ruby",
    "__Text",
    "__PStart",
    "__PEnd",
    "__MismatchStartParenthesis",
    "__MismatchEndParenthesis",
];

/// Elements treated as sentences by the sentence layer.
pub const SENTENCE_LIKE_TAGS: &[&str] = &["Sentence"];

/// Elements whose subtree the sentence layer does not look into.
pub const IGNORE_SENTENCE_TAGS: &[&str] = &["Rt"];

/// Number of leading hex digits of the SHA-512 digest used as table key.
pub const LAWNUM_KEY_LENGTH: usize = 7;

/// Japanese law number: era, year, issuing form, serial.
pub const LAW_NUM_PATTERN: &str =
    r"(?:明治|大正|昭和|平成|令和)[元〇一二三四五六七八九十]+年\S+?第[〇一二三四五六七八九十百千]+号";

/// What a scope qualifier phrase points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualifierTarget {
    /// The whole law (ROOT container).
    Law,
    /// The nearest enclosing container with this tag.
    Container(String),
}

/// A phrase such as `この章` and the container it designates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifierRule {
    pub phrase: String,
    pub target: QualifierTarget,
}

impl QualifierRule {
    #[must_use]
    pub fn new(phrase: impl Into<String>, target: QualifierTarget) -> Self {
        Self {
            phrase: phrase.into(),
            target,
        }
    }

    fn container(phrase: &str, tag: &str) -> Self {
        Self::new(phrase, QualifierTarget::Container(tag.to_string()))
    }
}

/// Runtime settings for an analysis run.
///
/// # Examples
/// ```
/// use lawtext_analyzer::config::{AnalysisConfig, QualifierTarget};
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.rule_for("この法律").map(|r| &r.target), Some(&QualifierTarget::Law));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Qualifier phrases recognized in `…において` scope clauses.
    pub qualifiers: Vec<QualifierRule>,

    /// Tags ignored by span extraction in addition to [`IGNORE_SPAN_TAGS`].
    pub extra_ignore_tags: Vec<String>,

    /// External law-number table replacing the embedded one.
    pub lawnum_table: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            qualifiers: vec![
                QualifierRule::new("この法律", QualifierTarget::Law),
                QualifierRule::new("この政令", QualifierTarget::Law),
                QualifierRule::new("この省令", QualifierTarget::Law),
                QualifierRule::new("この規則", QualifierTarget::Law),
                QualifierRule::container("この編", "Part"),
                QualifierRule::container("この章", "Chapter"),
                QualifierRule::container("この節", "Section"),
                QualifierRule::container("この款", "Subsection"),
                QualifierRule::container("この目", "Division"),
                QualifierRule::container("この条", "Article"),
                QualifierRule::container("この項", "Paragraph"),
                QualifierRule::container("この号", "Item"),
                QualifierRule::container("この附則", "SupplProvision"),
                QualifierRule::container("この表", "Table"),
            ],
            extra_ignore_tags: Vec::new(),
            lawnum_table: None,
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from YAML. Missing keys take default values.
    ///
    /// # Errors
    /// Returns `Yaml` for malformed YAML and `InvalidConfig` when the
    /// result does not pass [`AnalysisConfig::validate`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`AnalysisConfig::from_yaml_str`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Check that every rule has a phrase and points at a known container.
    ///
    /// # Errors
    /// Returns `InvalidConfig` describing the first offending rule.
    pub fn validate(&self) -> Result<()> {
        for rule in &self.qualifiers {
            if rule.phrase.trim().is_empty() {
                return Err(AnalyzerError::InvalidConfig(
                    "qualifier phrase must not be empty".to_string(),
                ));
            }
            if let QualifierTarget::Container(tag) = &rule.target {
                if !is_container_tag(tag) {
                    return Err(AnalyzerError::InvalidConfig(format!(
                        "qualifier '{}' targets unknown container <{tag}>",
                        rule.phrase
                    )));
                }
            }
        }
        Ok(())
    }

    /// Find the rule for an exact qualifier phrase.
    #[must_use]
    pub fn rule_for(&self, phrase: &str) -> Option<&QualifierRule> {
        self.qualifiers.iter().find(|r| r.phrase == phrase)
    }

    /// Whether span extraction skips elements with this tag.
    #[must_use]
    pub fn is_ignored(&self, tag: &str) -> bool {
        IGNORE_SPAN_TAGS.contains(&tag) || self.extra_ignore_tags.iter().any(|t| t == tag)
    }
}

/// Whether a tag names any kind of container.
#[must_use]
pub fn is_container_tag(tag: &str) -> bool {
    tag == ROOT_TAG
        || TOPLEVEL_CONTAINER_TAGS.contains(&tag)
        || ARTICLES_CONTAINER_TAGS.contains(&tag)
        || SPANS_CONTAINER_TAGS.contains(&tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.rule_for("この章").map(|r| &r.target),
            Some(&QualifierTarget::Container("Chapter".to_string()))
        );
        assert!(config.rule_for("あの章").is_none());
    }

    #[test]
    fn test_from_yaml_str_with_defaults() {
        let yaml = "extra_ignore_tags:\n  - Remarks\n";
        let config = AnalysisConfig::from_yaml_str(yaml).unwrap();
        assert!(config.is_ignored("Remarks"));
        assert!(config.is_ignored("LawTitle"));
        assert!(!config.is_ignored("Sentence"));
        assert_eq!(config.qualifiers, AnalysisConfig::default().qualifiers);
    }

    #[test]
    fn test_from_yaml_str_custom_qualifiers() {
        let yaml = r"
qualifiers:
  - phrase: この法律
    target: law
  - phrase: 本章
    target:
      container: Chapter
";
        let config = AnalysisConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.qualifiers.len(), 2);
        assert_eq!(
            config.rule_for("本章").map(|r| &r.target),
            Some(&QualifierTarget::Container("Chapter".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_unknown_container() {
        let yaml = r"
qualifiers:
  - phrase: この段
    target:
      container: Stanza
";
        let err = AnalysisConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("Stanza"));
    }

    #[test]
    fn test_validate_rejects_empty_phrase() {
        let config = AnalysisConfig {
            qualifiers: vec![QualifierRule::new(" ", QualifierTarget::Law)],
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_container_tag() {
        assert!(is_container_tag("Law"));
        assert!(is_container_tag("Chapter"));
        assert!(is_container_tag("Subitem3"));
        assert!(!is_container_tag("Sentence"));
    }
}
