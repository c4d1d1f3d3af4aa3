//! Alignment-to-tree shortcuts on top of the [`Raxml`] controller.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::bail;
use log::{info, warn};
use rand::Rng;

use crate::alignment::{Alignment, IdMap};
use crate::errors::{MissingParameterError, NotImplementedError};
use crate::io::get_tmp_filename;
use crate::raxml::{InputData, ParamMap, Parameters, Raxml, RaxmlResult, ResultKind};
use crate::sequences::SequenceType;
use crate::tree::Tree;
use crate::Result;

pub const DEFAULT_ALIGNMENT_MODEL: &str = "GTRCAT";

/// Trees and statistics of a [`raxml_alignment`] run.
#[derive(Debug, Clone)]
pub struct RaxmlAlignmentResult {
    pub tree: Tree,
    pub parsimony_tree: Tree,
    /// Log likelihood of the last log entry.
    pub log_likelihood: f64,
    /// Sum of the elapsed times in the log.
    pub total_exec_time: f64,
}

/// Runs raxmlHPC on an alignment with the given model (see [`DEFAULT_ALIGNMENT_MODEL`]),
/// returning the result tree, the parsimony starting tree, the final log likelihood and
/// the total execution time. Tip names are mapped back to the alignment's ids.
pub fn raxml_alignment(
    alignment: &Alignment,
    model: &str,
    params: &ParamMap,
) -> Result<RaxmlAlignmentResult> {
    raxml_alignment_with(
        Raxml::new().suppress_stdout(true).suppress_stderr(true),
        alignment,
        model,
        params,
    )
}

/// [`raxml_alignment`] with a preconfigured controller.
pub fn raxml_alignment_with(
    controller: Raxml,
    alignment: &Alignment,
    model: &str,
    params: &ParamMap,
) -> Result<RaxmlAlignmentResult> {
    let (phylip, id_map) = alignment.to_phylip()?;
    let mut rng = rand::thread_rng();
    let mut raxml = controller.params(params)?;
    let tmp_dir = env::temp_dir();
    raxml.parameters.on("-w", tmp_dir.display())?;
    raxml.parameters.on("-n", tmp_run_name(&tmp_dir))?;
    raxml.parameters.on("-m", model)?;
    raxml.parameters.on("-p", rng.gen_range(1..=100_000))?;

    let result = raxml.run(Some(InputData::Phylip(phylip)))?;
    let summary = summarise_alignment_run(&result, &id_map);
    result.clean_up()?;
    summary
}

fn summarise_alignment_run(result: &RaxmlResult, id_map: &IdMap) -> Result<RaxmlAlignmentResult> {
    let mut tree = result.tree(ResultKind::Result)?;
    restore_tip_names(&mut tree, id_map);
    let mut parsimony_tree = result.tree(ResultKind::ParsimonyTree)?;
    restore_tip_names(&mut parsimony_tree, id_map);

    let entries = result.log_entries()?;
    let total_exec_time: f64 = entries.iter().map(|(time, _)| time).sum();
    let log_likelihood = entries.last().map(|(_, logl)| *logl).unwrap_or_default();
    info!("Final log likelihood {log_likelihood} after {total_exec_time}s");
    Ok(RaxmlAlignmentResult {
        tree,
        parsimony_tree,
        log_likelihood,
        total_exec_time,
    })
}

/// Builds a tree from an alignment with a rapid bootstrap search, tip names mapped back
/// to the alignment's ids. Unless `-m` is given the model follows the molecule type.
/// Asking for the best tree of a full bootstrap analysis bails with [`NotImplementedError`].
pub fn build_tree_from_alignment(
    alignment: &Alignment,
    moltype: SequenceType,
    best_tree: bool,
    params: &ParamMap,
) -> Result<Tree> {
    build_tree_from_alignment_with(
        Raxml::new().suppress_stdout(true).suppress_stderr(true),
        alignment,
        moltype,
        best_tree,
        params,
    )
}

/// [`build_tree_from_alignment`] with a preconfigured controller.
pub fn build_tree_from_alignment_with(
    controller: Raxml,
    alignment: &Alignment,
    moltype: SequenceType,
    best_tree: bool,
    params: &ParamMap,
) -> Result<Tree> {
    if best_tree {
        bail!(NotImplementedError::new(
            "Best tree search is not available when building a tree from an alignment"
        ));
    }
    let (phylip, id_map) = alignment.to_phylip()?;
    let mut rng = rand::thread_rng();
    let mut raxml = controller.params(params)?;
    if !raxml.parameters.is_on("-m") {
        raxml.parameters.on("-m", moltype.default_model())?;
    }
    let tmp_dir = env::temp_dir();
    raxml.parameters.on("-w", tmp_dir.display())?;
    raxml.parameters.on("-n", tmp_run_name(&tmp_dir))?;
    raxml.parameters.on("-k", true)?;
    raxml.parameters.on("-p", rng.gen_range(1..=100_000))?;
    raxml.parameters.on("-x", rng.gen_range(1..=100_000))?;

    let result = raxml.run(Some(InputData::Phylip(phylip)))?;
    let tree = result.tree(ResultKind::Bootstrap);
    result.clean_up()?;
    let mut tree = tree?;
    restore_tip_names(&mut tree, &id_map);
    Ok(tree)
}

/// Runs raxmlHPC on PHYLIP text with the given parameters and returns the result tree.
/// Tip names are left as raxmlHPC wrote them, see [`restore_tip_names`].
///
/// Tree insertion (`-f v`) needs an existing starting tree in `-t`. Bootstrapping and
/// multiple randomised searches (`-b`, `-x`, `-k`, `-#` other than 1) bail with
/// [`NotImplementedError`]. Without `-w` and `-n` the temp directory and a random
/// run name are used.
pub fn build_tree_from_alignment_using_params(
    phylip: &str,
    moltype: SequenceType,
    params: &ParamMap,
) -> Result<Tree> {
    build_tree_from_alignment_using_params_with(
        Raxml::new().suppress_stdout(true).suppress_stderr(true),
        phylip,
        moltype,
        params,
    )
}

/// [`build_tree_from_alignment_using_params`] with a preconfigured controller.
pub fn build_tree_from_alignment_using_params_with(
    controller: Raxml,
    phylip: &str,
    moltype: SequenceType,
    params: &ParamMap,
) -> Result<Tree> {
    let mut raxml = controller.params(params)?;
    check_supported_search(&raxml.parameters)?;
    if !raxml.parameters.is_on("-m") {
        raxml.parameters.on("-m", moltype.default_model())?;
    }
    if raxml.parameters.value("-f") == Some("v") {
        check_starting_tree(raxml.parameters.value("-t"))?;
    }
    let output_dir = match raxml.parameters.value("-w") {
        Some(dir) => PathBuf::from(dir.trim_matches('"')),
        None => {
            let tmp_dir = env::temp_dir();
            raxml.parameters.on("-w", tmp_dir.display())?;
            tmp_dir
        }
    };
    if !raxml.parameters.is_on("-n") {
        raxml.parameters.on("-n", tmp_run_name(&output_dir))?;
    }

    let result = raxml.run(Some(InputData::Phylip(phylip.to_string())))?;
    let tree = result.tree(ResultKind::Result);
    result.clean_up()?;
    tree
}

fn check_supported_search(params: &Parameters) -> Result<()> {
    for flag in ["-b", "-x", "-k"] {
        if params.is_on(flag) {
            bail!(NotImplementedError::new(format!(
                "Bootstrapped tree building ({flag}) is not supported"
            )));
        }
    }
    if let Some(runs) = params.value("-#") {
        if runs.trim() != "1" {
            bail!(NotImplementedError::new(format!(
                "Multiple randomised searches (-# {runs}) are not supported"
            )));
        }
    }
    Ok(())
}

fn check_starting_tree(tree_file: Option<&str>) -> Result<()> {
    match tree_file {
        Some(path) if Path::new(path.trim_matches('"')).is_file() => Ok(()),
        Some(path) => bail!(MissingParameterError::new(format!(
            "Tree insertion needs a starting tree, {path} does not exist"
        ))),
        None => bail!(MissingParameterError::new(
            "Tree insertion needs a starting tree, set -t"
        )),
    }
}

fn tmp_run_name(dir: &Path) -> String {
    let path = get_tmp_filename(dir, "tmp", "");
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tmp".to_string())
}

/// Maps raxmlHPC tip labels back to the original sequence ids.
///
/// Inserted sequences come back as `QUERY___<label>___<n>`; the prefix and the numbered
/// suffix are removed before the lookup. Tips whose label is not in `id_map` keep their name.
///
/// # Example
/// ```
/// use phylo_raxml::alignment::IdMap;
/// use phylo_raxml::raxml::wrappers::restore_tip_names;
/// use phylo_raxml::tree::tree_parser::from_newick;
/// let mut tree = from_newick("(seq0000001:1.0,QUERY___seq0000002___7:1.0,X);").unwrap().remove(0);
/// let id_map = IdMap::from([
///     ("seq0000001".to_string(), "human".to_string()),
///     ("seq0000002".to_string(), "mouse".to_string()),
/// ]);
/// restore_tip_names(&mut tree, &id_map);
/// assert_eq!(tree.leaf_ids(), ["human", "mouse", "X"]);
/// ```
pub fn restore_tip_names(tree: &mut Tree, id_map: &IdMap) {
    tree.rename_tips(|id| {
        let stripped = strip_numbered_suffixes(id.strip_prefix("QUERY___").unwrap_or(id));
        match id_map.get(&stripped) {
            Some(original) => original.clone(),
            None => {
                warn!("Tip {id} not found among the alignment labels, keeping it");
                id.to_string()
            }
        }
    });
}

/// Removes every `___<digits>` run from a label.
fn strip_numbered_suffixes(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut rest = label;
    while let Some(pos) = rest.find("___") {
        let after = &rest[pos + 3..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 {
            out.push_str(&rest[..pos]);
            rest = &after[digits..];
        } else {
            out.push_str(&rest[..pos + 1]);
            rest = &rest[pos + 1..];
        }
    }
    out.push_str(rest);
    out
}
