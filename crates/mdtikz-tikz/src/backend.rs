//! Fragment backends producing SVG from TikZ code.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// Default timeout for each external program.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Number of trailing LaTeX log lines kept in [`BackendError::Failed`].
const LOG_TAIL_LINES: usize = 20;

/// Backend error.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// I/O error in the working directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// Program exited unsuccessfully.
    #[error("{program} failed with {status}{}", log_suffix(.log))]
    Failed {
        program: String,
        status: ExitStatus,
        /// Tail of the LaTeX log, if one was written.
        log: String,
    },
    /// Program did not finish in time and was killed.
    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    /// Program succeeded but did not write the expected file.
    #[error("expected output {} was not produced", .0.display())]
    MissingOutput(PathBuf),
}

/// Produces a rendered payload (SVG markup) from diagram source.
pub trait FragmentBackend: Send + Sync {
    /// Render `content` with backend-specific `options`.
    fn generate(
        &self,
        content: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<String, BackendError>;
}

/// Programs and limits of [`LatexBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LatexConfig {
    /// LaTeX engine producing PDF (`lualatex`).
    pub latex: String,
    /// PDF to SVG converter.
    pub pdf2svg: String,
    /// Time limit for each program.
    pub timeout: Duration,
}

impl Default for LatexConfig {
    fn default() -> Self {
        Self {
            latex: "lualatex".to_owned(),
            pdf2svg: "pdf2svg".to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Renders TikZ through a standalone LaTeX document and `pdf2svg`.
///
/// Recognized options: `tikzlibrary` (argument of `\usetikzlibrary`) and
/// `tikzoption` (options of the `tikzpicture` environment).
#[derive(Clone, Debug, Default)]
pub struct LatexBackend {
    config: LatexConfig,
}

impl LatexBackend {
    #[must_use]
    pub fn new(config: LatexConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &LatexConfig {
        &self.config
    }

    /// Run `program` in `dir`, killing it once the timeout expires.
    fn run(&self, program: &str, args: &[&OsStr], dir: &Path) -> Result<(), BackendError> {
        tracing::debug!(program, ?args, "Running");
        let mut child = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| BackendError::Spawn {
                program: program.to_owned(),
                source,
            })?;

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if start.elapsed() > self.config.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(BackendError::Timeout {
                    program: program.to_owned(),
                    timeout: self.config.timeout,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        if status.success() {
            Ok(())
        } else {
            Err(BackendError::Failed {
                program: program.to_owned(),
                status,
                log: read_log_tail(&dir.join("tikz.log")),
            })
        }
    }
}

impl FragmentBackend for LatexBackend {
    fn generate(
        &self,
        content: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<String, BackendError> {
        let library = options.get("tikzlibrary").map_or("", String::as_str);
        let option = options.get("tikzoption").map_or("", String::as_str);

        let dir = tempfile::tempdir()?;
        let tex_path = dir.path().join("tikz.tex");
        let pdf_path = dir.path().join("tikz.pdf");
        let svg_path = dir.path().join("tikz.svg");

        std::fs::write(&tex_path, latex_document(content, library, option))?;

        let started = Instant::now();
        self.run(
            &self.config.latex,
            &[
                OsStr::new("--interaction=nonstopmode"),
                OsStr::new("--output-directory"),
                dir.path().as_os_str(),
                tex_path.as_os_str(),
            ],
            dir.path(),
        )?;
        if !pdf_path.exists() {
            return Err(BackendError::MissingOutput(pdf_path));
        }

        self.run(
            &self.config.pdf2svg,
            &[pdf_path.as_os_str(), svg_path.as_os_str()],
            dir.path(),
        )?;

        let svg = match std::fs::read_to_string(&svg_path) {
            Ok(svg) => svg,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BackendError::MissingOutput(svg_path));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            elapsed = ?started.elapsed(),
            bytes = svg.len(),
            "Rendered TikZ figure"
        );
        Ok(svg)
    }
}

/// Standalone LaTeX document wrapping a `tikzpicture`.
#[must_use]
pub fn latex_document(code: &str, library: &str, option: &str) -> String {
    format!(
        "\\documentclass[tikz, border=10pt]{{standalone}}\n\
         \\usetikzlibrary{{{library}}}\n\
         \\begin{{document}}\n\
         \\begin{{tikzpicture}}[{option}]\n\
         {code}\n\
         \\end{{tikzpicture}}\n\
         \\end{{document}}\n"
    )
}

fn log_suffix(log: &str) -> String {
    if log.is_empty() {
        String::new()
    } else {
        format!(":\n{log}")
    }
}

fn read_log_tail(path: &Path) -> String {
    let Ok(bytes) = std::fs::read(path) else {
        return String::new();
    };
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(LOG_TAIL_LINES)..].join("\n")
}
