use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Error};
use clap::Parser;
use ftail::Ftail;
use log::{info, warn};

use phylo_raxml::alignment::{Alignment, IdMap};
use phylo_raxml::io::{
    get_tmp_filename, read_newick_from_file, read_phylip, write_newick_to_file,
};
use phylo_raxml::raxml::wrappers::{
    build_tree_from_alignment_using_params_with, build_tree_from_alignment_with,
    restore_tip_names,
};
use phylo_raxml::raxml::{ParamMap, Raxml};
use phylo_raxml::tree::Tree;

mod cli;
use crate::cli::{Cli, Config, ConfigBuilder};

type Result<T> = std::result::Result<T, Error>;

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            bail!("Unable to parse command line arguments: \n {}", error)
        }
    };
    let cfg_build: ConfigBuilder = cli.into();
    let cfg = cfg_build.setup()?;
    Ftail::new()
        .console(cfg.log_level)
        .init()
        .map_err(|e| anyhow!("Unable to set up logging: {e}"))?;

    info!("raxmlHPC tree building started.");
    info!("{}", cfg);

    let records = read_phylip(&cfg.alignment)?;
    let aln = match cfg.seq_type {
        Some(seq_type) => Alignment::with_type(records, seq_type)?,
        None => Alignment::new(records)?,
    };
    let seq_type = aln.seq_type();
    info!(
        "Read {} {} sequences of length {}.",
        aln.seq_count(),
        seq_type,
        aln.len()
    );

    let controller = Raxml::with_working_dir(&cfg.working_dir)
        .binary(&cfg.binary)
        .suppress_stdout(true)
        .suppress_stderr(true);
    if let Err(error) = controller.check_version() {
        warn!("{error}");
    }

    let mut params = ParamMap::new();
    if let Some(model) = &cfg.model {
        params.insert("-m".to_string(), model.clone());
    }

    let tree = match &cfg.starting_tree {
        Some(tree_file) => run_with_starting_tree(controller, &aln, tree_file, &cfg, params)?,
        None => {
            info!("No starting tree provided, running a rapid bootstrap search.");
            build_tree_from_alignment_with(controller, &aln, seq_type, false, &params)?
        }
    };

    info!("Putting resulting tree in {}", cfg.out_tree.display());
    write_newick_to_file(&[tree], &cfg.out_tree)?;
    Ok(())
}

fn run_with_starting_tree(
    controller: Raxml,
    aln: &Alignment,
    tree_file: &Path,
    cfg: &Config,
    mut params: ParamMap,
) -> Result<Tree> {
    let (phylip, id_map) = aln.to_phylip()?;
    let relabelled = relabel_starting_tree(tree_file, &id_map)?;
    params.insert("-t".to_string(), relabelled.display().to_string());
    if cfg.insert {
        info!("Inserting sequences into the tree from {}.", tree_file.display());
        params.insert("-f".to_string(), "v".to_string());
    } else {
        info!("Searching from the tree in {}.", tree_file.display());
    }

    let seq_type = aln.seq_type();
    let result =
        build_tree_from_alignment_using_params_with(controller, &phylip, seq_type, &params);
    fs::remove_file(&relabelled)?;
    let mut tree = result?;
    restore_tip_names(&mut tree, &id_map);
    Ok(tree)
}

/// Writes a copy of the starting tree labelled with the ids used in the PHYLIP input.
fn relabel_starting_tree(tree_file: &Path, id_map: &IdMap) -> Result<PathBuf> {
    let mut trees = read_newick_from_file(tree_file)?;
    if trees.is_empty() {
        bail!("No tree found in {}", tree_file.display());
    }
    let mut tree = trees.remove(0);
    let labels: HashMap<&str, &str> = id_map
        .iter()
        .map(|(label, id)| (id.as_str(), label.as_str()))
        .collect();
    tree.rename_tips(|id| match labels.get(id) {
        Some(label) => label.to_string(),
        None => {
            warn!("Tip {id} of the starting tree is not in the alignment");
            id.to_string()
        }
    });
    let path = get_tmp_filename(&env::temp_dir(), "tmp", ".tre");
    write_newick_to_file(&[tree], &path)?;
    Ok(path)
}
