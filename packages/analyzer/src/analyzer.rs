//! Analysis pipeline that ties all components together.

use std::fs;
use std::path::Path;

use crate::config::AnalysisConfig;
use crate::container::ContainerTree;
use crate::declaration::Declarations;
use crate::detect::{detect_declarations, DetectContext};
use crate::el::xml::parse_xml;
use crate::el::{ElTree, NodeId};
use crate::error::Result;
use crate::extract::extract_spans;
use crate::lawnum_table::{LawNumTable, LAWNUM_TABLE};
use crate::resolve::{detect_variable_references, VarRef};
use crate::sentence::{detect_tokens, get_sentence_envs, SentenceEnvs, Tokens};
use crate::span::Span;

/// Everything the pipeline produces for one law.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub spans: Vec<Span>,
    /// Span-indexed container tree.
    pub container_tree: ContainerTree,
    /// Container elements with their span ranges, in closing order.
    pub containers: Vec<(NodeId, (usize, usize))>,
    pub declarations: Declarations,
    pub var_refs: Vec<VarRef>,
    pub sentence_envs: SentenceEnvs,
    pub tokens: Tokens,
}

/// Analyze a law with the built-in configuration and law-number table.
///
/// The tree is annotated in place.
///
/// # Examples
/// ```
/// use lawtext_analyzer::analyzer::analyze;
/// use lawtext_analyzer::el::xml::parse_xml;
///
/// let mut tree = parse_xml(
///     "<Law><LawBody><MainProvision><Article Num=\"1\"><Paragraph Num=\"1\"><ParagraphSentence>\
///      <Sentence>電子計算機（以下「計算機」という。）を用いる。この計算機は</Sentence>\
///      </ParagraphSentence></Paragraph></Article></MainProvision></LawBody></Law>",
/// )
/// .unwrap();
/// let analysis = analyze(&mut tree);
/// assert_eq!(analysis.declarations.len(), 1);
/// assert_eq!(analysis.var_refs.len(), 1);
/// ```
pub fn analyze(tree: &mut ElTree) -> Analysis {
    analyze_with(tree, &AnalysisConfig::default(), &LAWNUM_TABLE)
}

/// Analyze a law with an explicit configuration and law-number table.
///
/// Runs span extraction, declaration detection, variable-reference
/// resolution, sentence environments and token matching, in that order.
pub fn analyze_with(tree: &mut ElTree, config: &AnalysisConfig, table: &LawNumTable) -> Analysis {
    let extracted = extract_spans(tree, config);

    let ctx = DetectContext {
        spans: &extracted.spans,
        containers: &extracted.container_tree,
        config,
        table,
    };
    let declarations = detect_declarations(tree, &ctx);
    let var_refs = detect_variable_references(tree, &extracted.spans, &declarations);

    let sentence_envs = get_sentence_envs(tree);
    let tokens = detect_tokens(tree, &sentence_envs);

    tracing::debug!(
        spans = extracted.spans.len(),
        declarations = declarations.len(),
        var_refs = var_refs.len(),
        sentences = sentence_envs.sentence_envs.len(),
        "Analysis complete"
    );

    Analysis {
        spans: extracted.spans,
        container_tree: extracted.container_tree,
        containers: extracted.containers,
        declarations,
        var_refs,
        sentence_envs,
        tokens,
    }
}

/// Read, parse and analyze a law XML file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not well-formed XML.
pub fn analyze_file(path: &Path, config: &AnalysisConfig, table: &LawNumTable) -> Result<(ElTree, Analysis)> {
    let xml = fs::read_to_string(path)?;
    let mut tree = parse_xml(&xml)?;
    let analysis = analyze_with(&mut tree, config, table);
    Ok((tree, analysis))
}
