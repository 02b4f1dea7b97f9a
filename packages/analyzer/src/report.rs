//! Serializable analysis summary.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

use crate::analyzer::Analysis;
use crate::container::ContainerType;
use crate::declaration::{Declaration, DeclarationType, ScopeRange};
use crate::error::Result;
use crate::resolve::VarRef;
use crate::sentence::tokens::{LawNumToken, PointerRangesToken};
use crate::span::SpanTextPos;

/// Output format of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Yaml,
    Json,
}

/// Container representation for the report.
#[derive(Debug, Serialize)]
struct ReportContainer {
    id: String,
    tag: String,
    #[serde(rename = "type")]
    container_type: ContainerType,
    /// Span range; absent for containers the span walk skips.
    #[serde(skip_serializing_if = "Option::is_none")]
    span_range: Option<(usize, usize)>,
    sentence_range: (usize, usize),
}

/// Declaration representation for the report.
#[derive(Debug, Serialize)]
struct ReportDeclaration {
    index: usize,
    #[serde(rename = "type")]
    declaration_type: DeclarationType,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    scope: Vec<ScopeRange>,
    name_pos: SpanTextPos,
}

impl From<&Declaration> for ReportDeclaration {
    fn from(d: &Declaration) -> Self {
        Self {
            index: d.declaration_index,
            declaration_type: d.declaration_type,
            name: d.name.clone(),
            value: d.value.clone(),
            scope: d.scope.clone(),
            name_pos: d.name_pos,
        }
    }
}

/// Variable reference representation for the report.
#[derive(Debug, Serialize)]
struct ReportVarRef {
    name: String,
    declaration_index: usize,
    ref_pos: SpanTextPos,
}

impl From<&VarRef> for ReportVarRef {
    fn from(r: &VarRef) -> Self {
        Self {
            name: r.ref_name.clone(),
            declaration_index: r.declaration_index,
            ref_pos: r.ref_pos,
        }
    }
}

/// Summary of one analysis run.
#[derive(Debug, Serialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    law_type: Option<String>,
    span_count: usize,
    sentence_count: usize,
    containers: Vec<ReportContainer>,
    declarations: Vec<ReportDeclaration>,
    var_refs: Vec<ReportVarRef>,
    law_nums: Vec<LawNumToken>,
    pointer_ranges: Vec<PointerRangesToken>,
}

impl Report {
    /// Build a report from an analysis.
    #[must_use]
    pub fn new(analysis: &Analysis) -> Self {
        let containers = analysis
            .sentence_envs
            .containers
            .iter()
            .map(|(_, c)| ReportContainer {
                id: c.id.clone(),
                tag: c.tag.clone(),
                container_type: c.container_type,
                span_range: analysis
                    .container_tree
                    .by_path(&c.id)
                    .map(|id| analysis.container_tree.get(id).range),
                sentence_range: c.range,
            })
            .collect();

        Self {
            law_type: analysis
                .sentence_envs
                .sentence_envs
                .first()
                .and_then(|env| env.law_type.clone())
                .or_else(|| analysis.spans.first().and_then(|s| s.env.law_type.clone())),
            span_count: analysis.spans.len(),
            sentence_count: analysis.sentence_envs.sentence_envs.len(),
            containers,
            declarations: analysis.declarations.iter().map(ReportDeclaration::from).collect(),
            var_refs: analysis.var_refs.iter().map(ReportVarRef::from).collect(),
            law_nums: analysis.tokens.law_nums.clone(),
            pointer_ranges: analysis.tokens.pointer_ranges.clone(),
        }
    }

    #[must_use]
    pub fn declaration_count(&self) -> usize {
        self.declarations.len()
    }

    #[must_use]
    pub fn var_ref_count(&self) -> usize {
        self.var_refs.len()
    }

    /// Serialize as YAML.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize in the given format.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Yaml => self.to_yaml(),
            ReportFormat::Json => self.to_json(),
        }
    }

    /// Write the report to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails.
    pub fn save(&self, path: &Path, format: ReportFormat) -> Result<()> {
        fs::write(path, self.render(format)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use crate::detect::test_support::law_with_articles;
    use crate::el::xml::parse_xml;
    use pretty_assertions::assert_eq;

    fn report() -> Report {
        let xml = law_with_articles(&[
            "電子計算機（以下「計算機」という。）を用いる。",
            "この計算機は、前条の規定による。",
        ]);
        let mut tree = parse_xml(&xml).unwrap();
        Report::new(&analyze(&mut tree))
    }

    #[test]
    fn test_report_counts() {
        let report = report();
        assert_eq!(report.declaration_count(), 1);
        assert_eq!(report.var_ref_count(), 1);
        assert_eq!(report.law_type.as_deref(), Some("Act"));
        assert_eq!(report.span_count, 10);
        assert_eq!(report.sentence_count, 2);
    }

    #[test]
    fn test_report_containers_have_both_ranges() {
        let report = report();
        let article = report
            .containers
            .iter()
            .find(|c| c.id == "Law/MainProvision/Article[2]")
            .unwrap();
        assert_eq!(article.span_range, Some((9, 10)));
        assert_eq!(article.sentence_range, (1, 2));
    }

    #[test]
    fn test_report_json() {
        let json = report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["declarations"][0]["name"], "計算機");
        assert_eq!(value["declarations"][0]["type"], "LawName");
        assert_eq!(value["var_refs"][0]["ref_pos"]["span_index"], 9);
        assert_eq!(value["pointer_ranges"][0]["ranges"][0]["from"][0]["rel_pos"], "PREV");
        assert_eq!(value["containers"][0]["type"], "ROOT");
    }

    #[test]
    fn test_report_yaml() {
        let yaml = report().render(ReportFormat::Yaml).unwrap();
        assert!(yaml.contains("declarations:"));
        assert!(yaml.contains("name: 計算機"));
        assert!(yaml.contains("target_type: Article"));
    }

    #[test]
    fn test_report_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report().save(&path, ReportFormat::Json).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.trim_start().starts_with('{'));
    }
}
