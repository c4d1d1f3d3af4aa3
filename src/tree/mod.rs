use std::fmt::{Debug, Display};

use anyhow::bail;

use crate::errors::DataError;
use crate::Result;

pub mod tree_parser;

/// A tree node. Leaves have no children, the root has no parent.
/// Branch lengths are optional since newick does not require them.
#[derive(Clone, PartialEq)]
pub struct Node {
    pub idx: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub blen: Option<f64>,
    pub id: String,
}

impl Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.id.is_empty() {
            write!(
                f,
                "{}:{:?}, parent: {:?}, children: {:?}",
                self.idx, self.blen, self.parent, self.children,
            )
        } else {
            write!(
                f,
                "({}) {}:{:?}, parent: {:?}, children: {:?}",
                self.id, self.idx, self.blen, self.parent, self.children,
            )
        }
    }
}

impl Node {
    pub(crate) fn new(idx: usize, parent: Option<usize>) -> Self {
        Self {
            idx,
            parent,
            children: Vec::new(),
            blen: None,
            id: String::new(),
        }
    }

    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }
}

/// Multifurcating tree as read from raxmlHPC output, stored as a node arena.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    pub root: usize,
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Number of nodes in the tree, tips and internal nodes together.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// Node indices from the root down, children visited left to right.
    pub fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.nodes[idx].children.iter().rev());
        }
        order
    }

    /// Tip nodes in the order they appear in the newick string.
    pub fn tips(&self) -> Vec<&Node> {
        self.preorder()
            .into_iter()
            .map(|idx| &self.nodes[idx])
            .filter(|node| node.is_tip())
            .collect()
    }

    pub fn leaf_ids(&self) -> Vec<String> {
        self.tips().iter().map(|node| node.id.clone()).collect()
    }

    /// Finds the tip with the given name.
    ///
    /// # Example
    /// ```
    /// use phylo_raxml::tree::tree_parser::from_newick;
    /// let tree = from_newick("((A:1.0,B:2.0)E:1.0,C:3.0);").unwrap().remove(0);
    /// assert!(tree.tip_by_id("B").is_ok());
    /// assert!(tree.tip_by_id("E").is_err());
    /// ```
    pub fn tip_by_id(&self, id: &str) -> Result<&Node> {
        match self.nodes.iter().find(|n| n.is_tip() && n.id == id) {
            Some(node) => Ok(node),
            None => bail!(DataError::new(format!("No tip with id {id} in the tree"))),
        }
    }

    /// Applies `rename` to every tip name, leaving internal node labels untouched.
    pub fn rename_tips<F>(&mut self, mut rename: F)
    where
        F: FnMut(&str) -> String,
    {
        for node in self.nodes.iter_mut().filter(|n| n.children.is_empty()) {
            node.id = rename(&node.id);
        }
    }

    /// Newick string with branch lengths wherever the tree has them.
    ///
    /// # Example
    /// ```
    /// use phylo_raxml::tree::tree_parser::from_newick;
    /// let newick = "(C:1.0,(A:1.0,B:1.0):1.0,D);";
    /// let tree = from_newick(newick).unwrap().remove(0);
    /// assert_eq!(tree.to_newick(), newick);
    /// assert_eq!(tree.to_newick_topology(), "(C,(A,B),D);");
    /// ```
    pub fn to_newick(&self) -> String {
        format!("{};", self.subtree_to_newick(self.root, true))
    }

    /// Newick string of the topology and node labels only.
    pub fn to_newick_topology(&self) -> String {
        format!("{};", self.subtree_to_newick(self.root, false))
    }

    fn subtree_to_newick(&self, idx: usize, with_distances: bool) -> String {
        let node = &self.nodes[idx];
        let mut out = String::new();
        if !node.children.is_empty() {
            let children: Vec<String> = node
                .children
                .iter()
                .map(|&child| self.subtree_to_newick(child, with_distances))
                .collect();
            out.push('(');
            out.push_str(&children.join(","));
            out.push(')');
        }
        out.push_str(&format_label(&node.id));
        if with_distances {
            if let Some(blen) = node.blen {
                out.push_str(&format!(":{blen:?}"));
            }
        }
        out
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_newick())
    }
}

const RESERVED: &[char] = &['(', ')', '[', ']', '\'', ':', ';', ','];

fn format_label(id: &str) -> String {
    if id.chars().any(|c| c.is_whitespace() || RESERVED.contains(&c)) {
        format!("'{}'", id.replace('\'', "''"))
    } else {
        id.to_string()
    }
}
