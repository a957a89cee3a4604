//! `mdtikz render` command implementation.

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use mdtikz_config::{CliSettings, Config, HeadingsMode};
use mdtikz_nested::{KeepHeadings, Pipeline, ReportHeadings, SourceTabs, Stage, StripHeadings};
use mdtikz_tikz::{LatexBackend, LatexConfig, TIKZ_LANGUAGE, TikzOptions, TikzProcessorFactory};

use crate::error::CliError;
use crate::output::Output;

/// Priority of the tab group stage.
const TABS_PRIORITY: i32 = 50;

/// Priority of the TikZ stage.
const TIKZ_PRIORITY: i32 = 30;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Path to the markdown file.
    pub(crate) input: PathBuf,

    /// Output HTML file (default: stdout).
    #[arg(short, long)]
    pub(crate) output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdtikz.toml).
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// LaTeX engine (overrides config).
    #[arg(long, env = "MDTIKZ_LATEX")]
    pub(crate) latex: Option<String>,

    /// PDF to SVG converter (overrides config).
    #[arg(long)]
    pub(crate) pdf2svg: Option<String>,

    /// Timeout in seconds for each external program (overrides config).
    #[arg(long)]
    pub(crate) timeout: Option<u64>,

    /// Extract the page title from the first H1 heading.
    #[arg(long)]
    pub(crate) title: bool,

    /// Do not extract the page title.
    #[arg(long, conflicts_with = "title")]
    pub(crate) no_title: bool,

    /// Enable verbose output (show render timing logs).
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            latex: self.latex.clone(),
            pdf2svg: self.pdf2svg.clone(),
            timeout_secs: self.timeout,
            extract_title: self.resolve_extract_title(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::debug!(path = %path.display(), "Loaded configuration");
        }

        let markdown = std::fs::read_to_string(&self.input)?;

        let started = Instant::now();
        let result = build_pipeline(&config).render(&markdown);
        tracing::info!(
            input = %self.input.display(),
            elapsed = ?started.elapsed(),
            warnings = result.warnings.len(),
            "Rendered document"
        );

        for warning in &result.warnings {
            output.warning(&format!("Warning: {warning}"));
        }
        if let Some(title) = &result.title {
            output.info(&format!("Title: {title}"));
        }

        if let Some(path) = &self.output {
            std::fs::write(path, &result.html)?;
            output.success(&format!("Wrote {}", path.display()));
        } else {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(result.html.as_bytes())?;
            stdout.write_all(b"\n")?;
        }

        Ok(())
    }

    fn resolve_extract_title(&self) -> Option<bool> {
        if self.no_title {
            Some(false)
        } else if self.title {
            Some(true)
        } else {
            None
        }
    }
}

/// Host pipeline with tab groups and TikZ figures.
pub(crate) fn build_pipeline(config: &Config) -> Pipeline {
    let backend = LatexBackend::new(LatexConfig {
        latex: config.tikz.latex.clone(),
        pdf2svg: config.tikz.pdf2svg.clone(),
        timeout: config.tikz.timeout(),
    });
    let factory = TikzProcessorFactory::new(backend)
        .with_defaults(TikzOptions::new(
            &config.tikz.library,
            &config.tikz.option,
        ))
        .with_tabs(SourceTabs::new(
            &config.tikz.source_title,
            &config.tikz.result_title,
        ));

    let builder = Pipeline::builder()
        .with_stage(Stage::tabs(TABS_PRIORITY))
        .with_stage(Stage::processor(TIKZ_LANGUAGE, TIKZ_PRIORITY, factory))
        .with_gfm(config.markdown.gfm)
        .with_title_extraction(config.markdown.extract_title)
        .with_tag(&config.namespace.tag);

    match config.namespace.headings {
        HeadingsMode::Keep => builder.with_heading_policy(KeepHeadings),
        HeadingsMode::Report => builder.with_heading_policy(ReportHeadings),
        HeadingsMode::Strip => builder.with_heading_policy(StripHeadings),
    }
    .build()
}
