use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::bail;
use clap::Parser;
use log::LevelFilter;

use phylo_raxml::errors::{DataError, MissingParameterError};
use phylo_raxml::raxml::RAXML_BINARY;
use phylo_raxml::sequences::SequenceType;
use crate::Result;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub(super) struct Cli {
    /// Alignment file in PHYLIP format
    #[arg(short, long, value_name = "ALIGNMENT_FILE")]
    pub(super) alignment: PathBuf,

    /// Molecule type of the alignment: DNA, RNA or protein. Detected from the sequences if absent
    #[arg(short = 't', long, value_name = "MOLTYPE")]
    pub(super) moltype: Option<String>,

    /// Substitution model passed to raxmlHPC, e.g. GTRGAMMA
    #[arg(short, long, value_name = "MODEL")]
    pub(super) model: Option<String>,

    /// Directory raxmlHPC is started in
    #[arg(short, long, value_name = "WORKING_DIR")]
    pub(super) working_dir: Option<PathBuf>,

    /// Output tree file in newick format
    #[arg(short, long, value_name = "OUT_TREE")]
    pub(super) out_tree: PathBuf,

    /// Starting tree in newick format, tip names matching the alignment
    #[arg(short, long, value_name = "TREE_FILE")]
    pub(super) starting_tree: Option<PathBuf>,

    /// Insert the sequences missing from the starting tree instead of a full search
    #[arg(short, long, requires = "starting_tree")]
    pub(super) insert: bool,

    /// Name or path of the raxmlHPC executable
    #[arg(short, long, default_value = RAXML_BINARY)]
    pub(super) binary: String,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(short, long, default_value = "info")]
    pub(super) log_level: String,
}

pub(super) struct ConfigBuilder {
    alignment: PathBuf,
    moltype: Option<String>,
    model: Option<String>,
    working_dir: Option<PathBuf>,
    out_tree: PathBuf,
    starting_tree: Option<PathBuf>,
    insert: bool,
    binary: String,
    log_level: String,
}

impl From<Cli> for ConfigBuilder {
    fn from(cli: Cli) -> Self {
        ConfigBuilder {
            alignment: cli.alignment,
            moltype: cli.moltype,
            model: cli.model,
            working_dir: cli.working_dir,
            out_tree: cli.out_tree,
            starting_tree: cli.starting_tree,
            insert: cli.insert,
            binary: cli.binary,
            log_level: cli.log_level,
        }
    }
}

impl ConfigBuilder {
    pub(super) fn setup(self) -> Result<Config> {
        if !self.alignment.is_file() {
            bail!(DataError::new(format!(
                "Alignment file {} does not exist",
                self.alignment.display()
            )));
        }
        if self.out_tree.exists() {
            bail!(DataError::new(format!(
                "Output file {} already exists",
                self.out_tree.display()
            )));
        }
        if let Some(tree_file) = &self.starting_tree {
            if !tree_file.is_file() {
                bail!(DataError::new(format!(
                    "Starting tree file {} does not exist",
                    tree_file.display()
                )));
            }
        } else if self.insert {
            bail!(MissingParameterError::new(
                "Sequence insertion needs a starting tree"
            ));
        }
        let seq_type = self
            .moltype
            .as_deref()
            .map(SequenceType::from_str)
            .transpose()?;
        let log_level = match LevelFilter::from_str(&self.log_level) {
            Ok(level) => level,
            Err(_) => bail!(DataError::new(format!(
                "Unknown log level: {}",
                self.log_level
            ))),
        };
        let working_dir = match self.working_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        Ok(Config {
            alignment: self.alignment,
            seq_type,
            model: self.model,
            working_dir,
            out_tree: self.out_tree,
            starting_tree: self.starting_tree,
            insert: self.insert,
            binary: self.binary,
            log_level,
        })
    }
}

#[derive(Debug)]
pub(super) struct Config {
    pub(super) alignment: PathBuf,
    pub(super) seq_type: Option<SequenceType>,
    pub(super) model: Option<String>,
    pub(super) working_dir: PathBuf,
    pub(super) out_tree: PathBuf,
    pub(super) starting_tree: Option<PathBuf>,
    pub(super) insert: bool,
    pub(super) binary: String,
    pub(super) log_level: LevelFilter,
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  alignment: {}", self.alignment.display())?;
        match &self.seq_type {
            Some(seq_type) => writeln!(f, "  molecule type: {seq_type}")?,
            None => writeln!(f, "  molecule type: detected from alignment")?,
        }
        match &self.model {
            Some(model) => writeln!(f, "  model: {model}")?,
            None => writeln!(f, "  model: molecule type default")?,
        }
        writeln!(f, "  working directory: {}", self.working_dir.display())?;
        writeln!(f, "  output tree: {}", self.out_tree.display())?;
        if let Some(tree_file) = &self.starting_tree {
            writeln!(f, "  starting tree: {}", tree_file.display())?;
            writeln!(f, "  insertion: {}", self.insert)?;
        }
        write!(f, "  binary: {}", self.binary)
    }
}
