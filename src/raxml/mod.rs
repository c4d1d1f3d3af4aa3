use std::env;
use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::bail;
use log::{debug, info};
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

use crate::errors::{ApplicationError, ApplicationNotFoundError, MissingParameterError};
use crate::Result;

mod parameters;
mod result;
mod runner;
pub mod wrappers;

pub use parameters::{ParamMap, Parameter, ParameterKind, Parameters};
pub use result::{output_file_name, RaxmlResult, ResultKind};
pub use runner::{find_executable, CommandRunner, RunOutput, ShellRunner};

pub const RAXML_BINARY: &str = "raxmlHPC";
pub const SUPPORTED_VERSION: (u32, u32, u32) = (7, 2, 6);

/// Parameters that must be on before raxmlHPC is started: input, model and run name.
const REQUIRED_PARAMETERS: [(&str, &str); 3] = [
    ("-s", "an input alignment file"),
    ("-m", "a substitution model"),
    ("-n", "a run name"),
];

/// Data handed to [`Raxml::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum InputData {
    /// An alignment file that already exists, passed to `-s` as is.
    Path(PathBuf),
    /// PHYLIP text, written to a temporary file for the duration of the run.
    Phylip(String),
}

/// Application controller for raxmlHPC.
///
/// Holds the parameter table and renders it into the shell command
/// `cd "<working dir>/"; raxmlHPC <parameters>` which a [`CommandRunner`] executes.
///
/// # Example
/// ```
/// use phylo_raxml::raxml::Raxml;
/// let mut raxml = Raxml::with_working_dir("/tmp");
/// assert_eq!(
///     raxml.base_command(),
///     r#"cd "/tmp/"; raxmlHPC -A S16 -B 0.03 -O 3600.0 -K GTR -e 0.1 -f d -c 50 -# 1"#
/// );
/// raxml.parameters.on("-m", "GTRCAT").unwrap();
/// assert!(raxml.base_command().contains("-m GTRCAT"));
/// ```
pub struct Raxml {
    pub parameters: Parameters,
    working_dir: PathBuf,
    binary: String,
    suppress_stdout: bool,
    suppress_stderr: bool,
    runner: Box<dyn CommandRunner>,
}

impl Default for Raxml {
    fn default() -> Self {
        Self::with_working_dir(env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

impl Raxml {
    /// Controller running in the current directory.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            parameters: Parameters::new(),
            working_dir: working_dir.into(),
            binary: RAXML_BINARY.to_string(),
            suppress_stdout: false,
            suppress_stderr: false,
            runner: Box::new(ShellRunner),
        }
    }

    /// Applies user parameters on top of the defaults.
    pub fn params(mut self, params: &ParamMap) -> Result<Self> {
        self.parameters.update(params)?;
        Ok(self)
    }

    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn suppress_stdout(mut self, suppress: bool) -> Self {
        self.suppress_stdout = suppress;
        self
    }

    pub fn suppress_stderr(mut self, suppress: bool) -> Self {
        self.suppress_stderr = suppress;
        self
    }

    pub fn runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn set_working_dir(&mut self, working_dir: impl Into<PathBuf>) {
        self.working_dir = working_dir.into();
    }

    /// The command string for the current parameters, recomputed on every call.
    pub fn base_command(&self) -> String {
        self.command_for(&self.parameters)
    }

    fn command_for(&self, params: &Parameters) -> String {
        let dir = self.working_dir.display().to_string();
        let rendered = params.render();
        let mut command = format!(
            "cd \"{}/\"; {}",
            escape_double_quoted(dir.trim_end_matches('/')),
            self.binary
        );
        if !rendered.is_empty() {
            command.push(' ');
            command.push_str(&rendered);
        }
        command
    }

    /// Directory raxmlHPC writes its output to: `-w` if set, the working directory otherwise.
    pub fn output_dir(&self) -> PathBuf {
        output_dir_for(&self.parameters, &self.working_dir)
    }

    /// Checks that input, model and run name are set.
    pub fn validate(&self) -> Result<()> {
        validate_parameters(&self.parameters)
    }

    /// Runs raxmlHPC with the current parameters, blocking until it exits.
    ///
    /// With `data` given, `-s` is set for this run only: paths are passed through,
    /// PHYLIP text goes to a temporary file that is removed once the process has exited.
    /// Bails with [`MissingParameterError`] before spawning anything if `-s`, `-m` or `-n`
    /// is unset, with [`ApplicationNotFoundError`] if the binary cannot be found and with
    /// [`ApplicationError`] if the process fails or does not write its result files.
    pub fn run(&self, data: Option<InputData>) -> Result<RaxmlResult> {
        let mut params = self.parameters.clone();
        let _input_file = match data {
            Some(InputData::Path(path)) => {
                params.on("-s", quote_path(&path))?;
                None
            }
            Some(InputData::Phylip(phylip)) => {
                let file = write_input_file(&phylip)?;
                params.on("-s", quote_path(file.path()))?;
                Some(file)
            }
            None => None,
        };
        validate_parameters(&params)?;

        if !self.runner.application_exists(&self.binary) {
            bail!(ApplicationNotFoundError::new(format!(
                "Cannot find {}. Is it installed and in your $PATH?",
                self.binary
            )));
        }

        let command = self.command_for(&params);
        info!("Running {}", self.binary);
        debug!("Command: {command}");
        let output = self
            .runner
            .run(&command, self.suppress_stdout, self.suppress_stderr)?;
        if !output.success() {
            bail!(ApplicationError::with_output(
                format!("{} did not finish successfully", self.binary),
                &output
            ));
        }
        info!("{} finished successfully", self.binary);
        RaxmlResult::collect(&params, &output_dir_for(&params, &self.working_dir), output)
    }

    /// Version reported by `raxmlHPC -v`, e.g. "This is RAxML version 7.2.6 released by ...".
    pub fn version(&self) -> Result<(u32, u32, u32)> {
        if !self.runner.application_exists(&self.binary) {
            bail!(ApplicationNotFoundError::new(format!(
                "Cannot find {}",
                self.binary
            )));
        }
        let output = self.runner.run(&format!("{} -v", self.binary), false, true)?;
        parse_version(&output.stdout)
    }

    /// Bails with an application error unless the installed binary is the supported version.
    pub fn check_version(&self) -> Result<()> {
        let version = self.version()?;
        if version != SUPPORTED_VERSION {
            bail!(ApplicationError::new(format!(
                "Unsupported raxmlHPC version. {} is required, but running {}.",
                version_string(SUPPORTED_VERSION),
                version_string(version)
            )));
        }
        Ok(())
    }
}

fn validate_parameters(params: &Parameters) -> Result<()> {
    for (name, description) in REQUIRED_PARAMETERS {
        if !params.is_on(name) {
            bail!(MissingParameterError::new(format!(
                "raxmlHPC needs {description}, set {name}"
            )));
        }
    }
    Ok(())
}

fn output_dir_for(params: &Parameters, working_dir: &Path) -> PathBuf {
    match params.value("-w") {
        Some(dir) => PathBuf::from(dir.trim_matches('"')),
        None => working_dir.to_path_buf(),
    }
}

fn write_input_file(phylip: &str) -> Result<NamedTempFile> {
    let mut file = TempFileBuilder::new()
        .prefix("tmp")
        .suffix(".txt")
        .tempfile_in(env::temp_dir())?;
    file.write_all(phylip.as_bytes())?;
    file.flush()?;
    info!("Wrote input alignment to {}", file.path().display());
    Ok(file)
}

/// Quotes a path for `sh` unless it only holds characters the shell takes literally.
fn quote_path(path: &Path) -> String {
    let path = path.display().to_string();
    if !path.chars().all(|c| c.is_ascii_alphanumeric() || "/._-+,:=@%".contains(c)) {
        format!("\"{}\"", escape_double_quoted(&path))
    } else {
        path
    }
}

/// Escapes the characters that keep their meaning inside a double-quoted `sh` word.
pub(crate) fn escape_double_quoted(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '"' | '$' | '`' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub(crate) fn parse_version(output: &str) -> Result<(u32, u32, u32)> {
    let word = output
        .lines()
        .find(|line| line.contains("version"))
        .and_then(|line| line.split_whitespace().nth(4));
    let numbers: Option<Vec<u32>> =
        word.and_then(|w| w.split('.').map(|n| n.parse::<u32>().ok()).collect());
    match numbers.as_deref() {
        Some([major, minor, patch]) => Ok((*major, *minor, *patch)),
        _ => bail!(ApplicationError::new(format!(
            "Cannot read raxmlHPC version from: {}",
            output.trim()
        ))),
    }
}

fn version_string(version: (u32, u32, u32)) -> String {
    format!("{}.{}.{}", version.0, version.1, version.2)
}

impl Display for Raxml {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base_command())
    }
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
pub(crate) mod tests;
