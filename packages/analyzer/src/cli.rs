//! Command-line interface for the analyzer.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;

use crate::analyzer::analyze_file;
use crate::config::AnalysisConfig;
use crate::el::xml::to_xml;
use crate::error::{AnalyzerError, Result};
use crate::lawnum_table::{LawNumTable, LAWNUM_TABLE};
use crate::report::{Report, ReportFormat};

/// Lawtext Analyzer - Detect defined terms, scopes and cross-references in
/// Japanese statutory text.
#[derive(Parser)]
#[command(name = "lawtext-analyzer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a law XML file and print a report.
    Analyze {
        /// Law XML file
        input: PathBuf,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Yaml)]
        format: ReportFormat,

        /// Write the annotated XML to this path
        #[arg(long)]
        output_xml: Option<PathBuf>,

        /// Analysis configuration (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Law number table (YAML), layered over the embedded one
        #[arg(long)]
        lawnum_table: Option<PathBuf>,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            format,
            output_xml,
            config,
            lawnum_table,
        } => analyze_command(
            &input,
            format,
            output_xml.as_deref(),
            config.as_deref(),
            lawnum_table.as_deref(),
        ),
    }
}

/// Execute the analyze command.
fn analyze_command(
    input: &Path,
    format: ReportFormat,
    output_xml: Option<&Path>,
    config_path: Option<&Path>,
    lawnum_table: Option<&Path>,
) -> Result<()> {
    if !input.is_file() {
        return Err(AnalyzerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input file does not exist: {}", input.display()),
        )));
    }

    let config = match config_path {
        Some(path) => AnalysisConfig::from_path(path)?,
        None => AnalysisConfig::default(),
    };

    // A table named in the config file is relative to that file.
    let table_path = lawnum_table.map(Path::to_path_buf).or_else(|| {
        config.lawnum_table.as_ref().map(|p| match config_path.and_then(Path::parent) {
            Some(dir) if p.is_relative() => dir.join(p),
            _ => p.clone(),
        })
    });
    let layered;
    let table: &LawNumTable = match &table_path {
        Some(path) => {
            let mut table = LAWNUM_TABLE.clone();
            table.extend(&LawNumTable::from_path(path)?);
            layered = table;
            &layered
        }
        None => &*LAWNUM_TABLE,
    };

    eprintln!("{} {}", style("Analyzing").bold(), style(input.display()).cyan());

    let (tree, analysis) = analyze_file(input, &config, table)?;
    let report = Report::new(&analysis);

    eprintln!("  Spans: {}", analysis.spans.len());
    eprintln!("  Sentences: {}", analysis.sentence_envs.sentence_envs.len());
    eprintln!("  Declarations: {}", style(report.declaration_count()).green());
    eprintln!("  References: {}", style(report.var_ref_count()).green());
    eprintln!("  Law numbers: {}", analysis.tokens.law_nums.len());
    eprintln!("  Pointer ranges: {}", analysis.tokens.pointer_ranges.len());

    println!("{}", report.render(format)?);

    if let Some(path) = output_xml {
        fs::write(path, to_xml(&tree, tree.root()))?;
        eprintln!("{} {}", style("Saved to:").green().bold(), path.display());
    }

    Ok(())
}
