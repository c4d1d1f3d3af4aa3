use std::fmt;

use anyhow::bail;
use log::info;
use pest::{error::Error as PestError, iterators::Pair, Parser};
use pest_derive::Parser;

use crate::tree::{Node, Tree};
use crate::Result;

#[derive(Parser)]
#[grammar = "./tree/newick.pest"]
pub struct NewickParser;

#[derive(Debug)]
pub struct ParsingError(pub(crate) Box<PestError<Rule>>);

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Malformed newick string")?;
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParsingError {}

/// Parses all trees in a newick string. Trees are kept exactly as written,
/// multifurcations included, so that raxmlHPC's unrooted output survives a round trip.
///
/// # Example
/// ```
/// use phylo_raxml::tree::tree_parser::from_newick;
/// let trees = from_newick("((A:0.1,B:0.2)0.9:0.3,C:0.4,D);").unwrap();
/// assert_eq!(trees.len(), 1);
/// assert_eq!(trees[0].tips().len(), 4);
/// ```
pub fn from_newick(newick_string: &str) -> Result<Vec<Tree>> {
    info!("Parsing newick trees.");
    let newick_rule = match NewickParser::parse(Rule::newick, newick_string) {
        Ok(mut pairs) => match pairs.next() {
            Some(rule) => rule,
            None => return Ok(Vec::new()),
        },
        Err(e) => bail!(ParsingError(Box::new(e))),
    };

    let mut trees = Vec::new();
    for tree_rule in newick_rule.into_inner() {
        if tree_rule.as_rule() != Rule::tree {
            continue;
        }
        let mut tree = Tree {
            root: 0,
            nodes: Vec::new(),
        };
        if let Some(root_rule) = tree_rule.into_inner().next() {
            tree.parse_node_rule(root_rule, None);
        }
        trees.push(tree);
    }
    info!("Finished parsing {} newick tree(s) successfully.", trees.len());
    Ok(trees)
}

impl Tree {
    fn parse_node_rule(&mut self, node_rule: Pair<Rule>, parent: Option<usize>) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node::new(idx, parent));
        if let Some(parent) = parent {
            self.nodes[parent].children.push(idx);
        }
        for rule in node_rule.into_inner() {
            match rule.as_rule() {
                Rule::internal | Rule::leaf => {
                    self.parse_node_rule(rule, Some(idx));
                }
                Rule::label => self.nodes[idx].id = parse_label_rule(rule),
                Rule::branch_length => self.nodes[idx].blen = parse_branch_length_rule(rule),
                _ => unreachable!(),
            }
        }
        idx
    }
}

fn parse_branch_length_rule(rule: Pair<Rule>) -> Option<f64> {
    rule.into_inner()
        .next()
        .and_then(|float| float.as_str().trim().parse::<f64>().ok())
}

fn parse_label_rule(rule: Pair<Rule>) -> String {
    let label = rule.as_str();
    match label.strip_prefix('\'').and_then(|l| l.strip_suffix('\'')) {
        Some(quoted) => quoted.replace("''", "'"),
        None => label.to_string(),
    }
}
