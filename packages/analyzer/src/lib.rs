//! Lawtext Analyzer - Detect defined terms, scopes and cross-references in
//! Japanese statutory text.
//!
//! This crate loads official law XML into an element tree, flattens it into
//! spans, recognizes defined-term declarations with their lexical scope and
//! rewrites every in-scope use of a term into a reference node. A sentence
//! layer adds law-number and pointer-range tokens.
//!
//! # Example
//!
//! ```
//! use lawtext_analyzer::{analyze, parse_xml};
//!
//! let mut tree = parse_xml(
//!     "<Law><LawBody><MainProvision><Article Num=\"1\"><Paragraph Num=\"1\"><ParagraphSentence>\
//!      <Sentence>行政手続法（平成五年法律第八十八号）第二条の規定による。</Sentence>\
//!      </ParagraphSentence></Paragraph></Article></MainProvision></LawBody></Law>",
//! )
//! .unwrap();
//! let analysis = analyze(&mut tree);
//! assert_eq!(analysis.declarations.get(0).unwrap().name, "行政手続法");
//! assert_eq!(analysis.tokens.law_nums[0].text, "平成五年法律第八十八号");
//! ```
//!
//! # Architecture
//!
//! The analyzer is organized into several modules:
//!
//! - [`config`]: Configuration constants and runtime settings
//! - [`error`]: Error types and Result alias
//! - [`el`]: Element tree, control nodes and XML conversion
//! - [`container`]: Container tree with sub linkage
//! - [`numeral`]: Kanji numerals
//! - [`lawnum_table`]: Law-name length table
//! - [`span`]: Spans and span positions
//! - [`extract`]: Span extraction
//! - [`declaration`]: Declarations and scope ranges
//! - [`range`]: Container references to text ranges
//! - [`detect`]: Declaration detection
//! - [`resolve`]: Variable-reference resolution
//! - [`sentence`]: Sentence environments, ranges and tokens
//! - [`analyzer`]: Analysis pipeline
//! - [`report`]: Serializable report
//! - [`cli`]: Command-line interface

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod container;
pub mod declaration;
pub mod detect;
pub mod el;
pub mod error;
pub mod extract;
pub mod lawnum_table;
pub mod numeral;
pub mod range;
pub mod report;
pub mod resolve;
pub mod sentence;
pub mod span;

// Re-export main functions
pub use analyzer::{analyze, analyze_file, analyze_with, Analysis};
pub use el::xml::{parse_xml, to_xml};

// Re-export commonly used items
pub use config::AnalysisConfig;
pub use declaration::{Declaration, DeclarationType, Declarations, ScopeRange};
pub use el::{ElTree, NodeId};
pub use error::{AnalyzerError, Result};
pub use lawnum_table::{LawNumTable, LAWNUM_TABLE};
pub use report::{Report, ReportFormat};
pub use resolve::VarRef;
pub use span::{Span, SpanTextPos};
