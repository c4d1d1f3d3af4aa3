use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::bail;
use log::{debug, info, warn};

use crate::errors::{ApplicationError, DataError};
use crate::raxml::parameters::Parameters;
use crate::raxml::runner::RunOutput;
use crate::tree::{tree_parser::from_newick, Tree};
use crate::Result;

/// Kinds of files raxmlHPC leaves in its output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResultKind {
    Info,
    Log,
    ParsimonyTree,
    /// Final tree of the run: the ML tree, or the labelled tree in insertion mode.
    Result,
    BestTree,
    Bootstrap,
    Classification,
    ClassificationLikelihoodWeights,
    OriginalLabelledTree,
    Entropy,
    Json,
    Parsimony,
    OriginalTree,
    Checkpoint(u32),
}

impl Display for ResultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Which files a run writes depends on the algorithm selected with `-f` and on `-k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Standard,
    Bootstrap,
    TreeInsertion,
    ParsimonyPlacement,
}

impl RunMode {
    fn from_parameters(params: &Parameters) -> Self {
        if params.is_on("-k") {
            RunMode::Bootstrap
        } else {
            match params.value("-f") {
                Some("v") => RunMode::TreeInsertion,
                Some("y") => RunMode::ParsimonyPlacement,
                _ => RunMode::Standard,
            }
        }
    }

    /// Output files of the mode, `true` marks the ones the run cannot succeed without.
    fn outputs(&self) -> Vec<(ResultKind, &'static str, bool)> {
        use ResultKind as K;
        let mut outputs = vec![(K::Info, "RAxML_info", true)];
        match self {
            RunMode::Bootstrap => outputs.push((K::Bootstrap, "RAxML_bootstrap", true)),
            RunMode::TreeInsertion => outputs.extend([
                (K::Result, "RAxML_labelledTree", true),
                (K::Classification, "RAxML_classification", false),
                (
                    K::ClassificationLikelihoodWeights,
                    "RAxML_classificationLikelihoodWeights",
                    false,
                ),
                (K::OriginalLabelledTree, "RAxML_originalLabelledTree", false),
                (K::Entropy, "RAxML_entropy", false),
                (K::Json, "RAxML_portableTree", false),
            ]),
            RunMode::ParsimonyPlacement => outputs.extend([
                (K::Parsimony, "RAxML_equallyParsimoniousPlacements", true),
                (K::OriginalTree, "RAxML_originalLabelledTree", false),
            ]),
            RunMode::Standard => outputs.extend([
                (K::Result, "RAxML_result", true),
                (K::Log, "RAxML_log", false),
                (K::ParsimonyTree, "RAxML_parsimonyTree", false),
                (K::BestTree, "RAxML_bestTree", false),
            ]),
        }
        outputs
    }
}

/// Path raxmlHPC uses for a given output file prefix and run name.
pub fn output_file_name(output_dir: &Path, prefix: &str, run_name: &str) -> PathBuf {
    if prefix == "RAxML_portableTree" {
        output_dir.join(format!("{prefix}.{run_name}.jplace"))
    } else {
        output_dir.join(format!("{prefix}.{run_name}"))
    }
}

/// Outcome of a raxmlHPC run: the captured process output and the files it wrote.
/// Files stay on disk until [`RaxmlResult::clean_up`] is called.
#[derive(Debug)]
pub struct RaxmlResult {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    files: BTreeMap<ResultKind, PathBuf>,
}

impl RaxmlResult {
    /// Collects the output files of a finished run. Bails with an application error
    /// if a file the run must have written is missing.
    pub(crate) fn collect(
        params: &Parameters,
        output_dir: &Path,
        output: RunOutput,
    ) -> Result<RaxmlResult> {
        let run_name = match params.value("-n") {
            Some(name) => name.trim_matches('"'),
            None => bail!(ApplicationError::new("No run name set, cannot locate output")),
        };
        let mode = RunMode::from_parameters(params);
        info!("Collecting {:?} run output from {}", mode, output_dir.display());

        let mut files = BTreeMap::new();
        for (kind, prefix, required) in mode.outputs() {
            let path = output_file_name(output_dir, prefix, run_name);
            if path.exists() {
                files.insert(kind, path);
            } else if required {
                bail!(ApplicationError::with_output(
                    format!("raxmlHPC did not write {}", path.display()),
                    &output,
                ));
            } else {
                debug!("Optional output {} not written", path.display());
            }
        }
        for (n, path) in checkpoint_files(output_dir, run_name)? {
            files.insert(ResultKind::Checkpoint(n), path);
        }

        Ok(RaxmlResult {
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            files,
        })
    }

    pub fn kinds(&self) -> impl Iterator<Item = &ResultKind> {
        self.files.keys()
    }

    pub fn path(&self, kind: ResultKind) -> Option<&Path> {
        self.files.get(&kind).map(PathBuf::as_path)
    }

    fn try_path(&self, kind: ResultKind) -> Result<&Path> {
        match self.path(kind) {
            Some(path) => Ok(path),
            None => bail!(ApplicationError::new(format!(
                "raxmlHPC run has no {kind} output"
            ))),
        }
    }

    /// Opens a handle to one of the output files. The handle is closed when dropped.
    pub fn open(&self, kind: ResultKind) -> Result<BufReader<File>> {
        Ok(BufReader::new(File::open(self.try_path(kind)?)?))
    }

    pub fn read_to_string(&self, kind: ResultKind) -> Result<String> {
        Ok(fs::read_to_string(self.try_path(kind)?)?)
    }

    /// Parses all newick trees in an output file.
    pub fn trees(&self, kind: ResultKind) -> Result<Vec<Tree>> {
        from_newick(&self.read_to_string(kind)?)
    }

    /// Parses the first newick tree in an output file.
    pub fn tree(&self, kind: ResultKind) -> Result<Tree> {
        let mut trees = self.trees(kind)?;
        if trees.len() > 1 {
            warn!("{kind} output holds {} trees, using the first", trees.len());
        }
        if trees.is_empty() {
            bail!(ApplicationError::new(format!("{kind} output holds no tree")));
        }
        Ok(trees.remove(0))
    }

    /// Reads the log file, one `(elapsed seconds, log likelihood)` pair per line.
    pub fn log_entries(&self) -> Result<Vec<(f64, f64)>> {
        parse_log(&self.read_to_string(ResultKind::Log)?)
    }

    /// Deletes every output file of the run.
    pub fn clean_up(self) -> Result<()> {
        for path in self.files.values() {
            if path.exists() {
                debug!("Removing {}", path.display());
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn parse_log(content: &str) -> Result<Vec<(f64, f64)>> {
    let mut entries = Vec::new();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let values: Vec<&str> = line.split_whitespace().collect();
        match values.as_slice() {
            [time, logl] => match (time.parse::<f64>(), logl.parse::<f64>()) {
                (Ok(time), Ok(logl)) => entries.push((time, logl)),
                _ => bail!(DataError::new(format!("Malformed raxmlHPC log line: {line}"))),
            },
            _ => bail!(DataError::new(format!("Malformed raxmlHPC log line: {line}"))),
        }
    }
    Ok(entries)
}

fn checkpoint_files(output_dir: &Path, run_name: &str) -> Result<Vec<(u32, PathBuf)>> {
    let prefix = format!("RAxML_checkpoint.{run_name}.");
    let mut checkpoints = Vec::new();
    for entry in fs::read_dir(output_dir)? {
        let path = entry?.path();
        let number = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix(&prefix))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(n) = number {
            checkpoints.push((n, path));
        }
    }
    checkpoints.sort();
    Ok(checkpoints)
}
