//! Phylogenetic trees over the genomes of a breakpoint graph.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Leaves are
//! genomes. A multicolor is *vtree-consistent* when it is exactly the leaf set
//! under some node (or a single leaf, or empty), and *tree-consistent* when it
//! is such a set or the complement of one.

use std::cell::OnceCell;
use std::collections::{HashSet, VecDeque};

use log::trace;
use thiserror::Error;

use crate::edge::BGEdge;
use crate::genome::Genome;
use crate::multicolor::Multicolor;

pub const DEFAULT_EDGE_LENGTH: f64 = 1.0;

#[derive(Error, Debug, PartialEq)]
pub enum TreeError {
    #[error("no tree node named {0:?}")]
    MissingNode(String),

    #[error("tree node {0:?} already exists")]
    DuplicateNode(String),

    #[error("Newick parse error at byte {offset}: {message}")]
    Newick { offset: usize, message: String },
}

pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct TreeNode {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    dist: f64,
}

impl TreeNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Length of the branch to the parent.
    pub fn dist(&self) -> f64 {
        self.dist
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Child end of a tree edge: internal nodes stay nodes, leaves become genomes.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEndpoint {
    Node(NodeId),
    Leaf(Genome),
}

#[derive(Debug, Clone)]
struct ConsistentMulticolors {
    tree: HashSet<Multicolor>,
    vtree: HashSet<Multicolor>,
}

#[derive(Debug, Clone, Default)]
pub struct BGTree {
    nodes: Vec<TreeNode>,
    root: Option<NodeId>,
    multicolors: OnceCell<ConsistentMulticolors>,
}

impl BGTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_newick(text: &str) -> Result<Self, TreeError> {
        let mut tree = BGTree::new();
        let mut parser = NewickParser { text, position: 0 };
        parser.skip_whitespace();
        if parser.at_end() {
            return Ok(tree);
        }
        let root = parser.parse_subtree(&mut tree, None)?;
        tree.root = Some(root);
        parser.skip_whitespace();
        parser.expect(';')?;
        parser.skip_whitespace();
        if !parser.at_end() {
            return Err(parser.error("unexpected text after ';'"));
        }
        Ok(tree)
    }

    fn push_node(&mut self, name: &str, parent: Option<NodeId>, dist: f64) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            dist,
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Node ids in preorder, starting at the root.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        order
    }

    /// Parent/child pairs in breadth-first order.
    pub fn edges(&self) -> Vec<(NodeId, TreeEndpoint)> {
        let mut edges = Vec::new();
        let mut queue: VecDeque<NodeId> = self.root.into_iter().collect();
        while let Some(id) = queue.pop_front() {
            for &child in &self.nodes[id].children {
                if self.nodes[child].is_leaf() {
                    edges.push((id, TreeEndpoint::Leaf(Genome::new(self.nodes[child].name.as_str()))));
                } else {
                    edges.push((id, TreeEndpoint::Node(child)));
                    queue.push_back(child);
                }
            }
        }
        edges
    }

    pub fn leaves(&self) -> Vec<Genome> {
        self.nodes()
            .into_iter()
            .filter(|&id| self.nodes[id].is_leaf())
            .map(|id| Genome::new(self.nodes[id].name.as_str()))
            .collect()
    }

    pub fn get_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes().into_iter().find(|&id| self.nodes[id].name == name)
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.get_node_by_name(name).is_some()
    }

    fn is_child_of(&self, parent: &str, child: &str) -> bool {
        self.get_node_by_name(parent).is_some_and(|id| {
            self.nodes[id]
                .children
                .iter()
                .any(|&candidate| self.nodes[candidate].name == child)
        })
    }

    pub fn has_edge(&self, parent: &str, child: &str, account_for_direction: bool) -> bool {
        self.is_child_of(parent, child) || (!account_for_direction && self.is_child_of(child, parent))
    }

    fn depth(&self, mut id: NodeId) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.nodes[id].parent {
            depth += 1;
            id = parent;
        }
        depth
    }

    /// Sum of branch lengths on the path between two named nodes.
    pub fn get_distance(&self, first: &str, second: &str) -> Result<f64, TreeError> {
        let mut a = self
            .get_node_by_name(first)
            .ok_or_else(|| TreeError::MissingNode(first.to_string()))?;
        let mut b = self
            .get_node_by_name(second)
            .ok_or_else(|| TreeError::MissingNode(second.to_string()))?;
        let (mut depth_a, mut depth_b) = (self.depth(a), self.depth(b));
        let mut distance = 0.0;
        while depth_a > depth_b {
            distance += self.nodes[a].dist;
            a = self.nodes[a].parent.ok_or_else(|| TreeError::MissingNode(first.to_string()))?;
            depth_a -= 1;
        }
        while depth_b > depth_a {
            distance += self.nodes[b].dist;
            b = self.nodes[b].parent.ok_or_else(|| TreeError::MissingNode(second.to_string()))?;
            depth_b -= 1;
        }
        while a != b {
            distance += self.nodes[a].dist + self.nodes[b].dist;
            match (self.nodes[a].parent, self.nodes[b].parent) {
                (Some(parent_a), Some(parent_b)) => {
                    a = parent_a;
                    b = parent_b;
                }
                _ => return Err(TreeError::MissingNode(format!("{first}/{second}"))),
            }
        }
        Ok(distance)
    }

    /// Hang a new child under `parent`. An empty tree takes `parent` as root.
    pub fn add_edge(&mut self, parent: &str, child: &str, length: f64) -> Result<(), TreeError> {
        if self.has_node(child) || (self.is_empty() && parent == child) {
            return Err(TreeError::DuplicateNode(child.to_string()));
        }
        let parent_id = match self.get_node_by_name(parent) {
            Some(id) => id,
            None if self.is_empty() => {
                let root = self.push_node(parent, None, DEFAULT_EDGE_LENGTH);
                self.root = Some(root);
                root
            }
            None => return Err(TreeError::MissingNode(parent.to_string())),
        };
        self.push_node(child, Some(parent_id), length);
        self.multicolors.take();
        Ok(())
    }

    /// Graft a copy of `other` under the node called `node_name`.
    pub fn append(&mut self, node_name: &str, other: &BGTree) -> Result<(), TreeError> {
        let target = self
            .get_node_by_name(node_name)
            .ok_or_else(|| TreeError::MissingNode(node_name.to_string()))?;
        let Some(other_root) = other.root else {
            return Ok(());
        };
        let mut stack = vec![(other_root, target)];
        while let Some((source, parent)) = stack.pop() {
            let node = &other.nodes[source];
            let copy = self.push_node(&node.name, Some(parent), node.dist);
            stack.extend(node.children.iter().rev().map(|&child| (child, copy)));
        }
        self.multicolors.take();
        Ok(())
    }

    /// Leaf sets under every node, every single leaf, and the empty multicolor.
    fn leaf_sets(&self) -> Vec<Multicolor> {
        let mut sets = vec![Multicolor::new()];
        for id in self.nodes() {
            let mut leaves = Multicolor::new();
            let mut stack = vec![id];
            while let Some(current) = stack.pop() {
                let node = &self.nodes[current];
                if node.is_leaf() {
                    leaves.update([Genome::new(node.name.as_str())]);
                } else {
                    stack.extend(node.children.iter().copied());
                }
            }
            sets.push(leaves.without_multiplicity());
        }
        sets
    }

    fn consistent_multicolors(&self) -> &ConsistentMulticolors {
        self.multicolors.get_or_init(|| {
            let vtree: HashSet<Multicolor> = self.leaf_sets().into_iter().collect();
            let full: Multicolor = self.leaves().into_iter().collect::<Multicolor>().without_multiplicity();
            let mut tree = vtree.clone();
            tree.extend(vtree.iter().map(|multicolor| &full - multicolor));
            trace!(
                "Computed {} tree-consistent and {} vtree-consistent multicolors",
                tree.len(),
                vtree.len()
            );
            ConsistentMulticolors { tree, vtree }
        })
    }

    pub fn multicolors_are_up_to_date(&self) -> bool {
        self.multicolors.get().is_some()
    }

    pub fn get_tree_consistent_multicolors(&self) -> Vec<Multicolor> {
        let mut multicolors: Vec<Multicolor> = self.consistent_multicolors().tree.iter().cloned().collect();
        multicolors.sort();
        multicolors
    }

    pub fn get_vtree_consistent_multicolors(&self) -> Vec<Multicolor> {
        let mut multicolors: Vec<Multicolor> = self.consistent_multicolors().vtree.iter().cloned().collect();
        multicolors.sort();
        multicolors
    }

    pub fn multicolor_is_tree_consistent(&self, multicolor: &Multicolor) -> bool {
        self.consistent_multicolors()
            .tree
            .contains(&multicolor.without_multiplicity())
    }

    pub fn multicolor_is_vtree_consistent(&self, multicolor: &Multicolor) -> bool {
        self.consistent_multicolors()
            .vtree
            .contains(&multicolor.without_multiplicity())
    }

    pub fn bgedge_is_tree_consistent(&self, edge: &BGEdge) -> bool {
        self.multicolor_is_tree_consistent(&edge.multicolor)
    }

    pub fn bgedge_is_vtree_consistent(&self, edge: &BGEdge) -> bool {
        self.multicolor_is_vtree_consistent(&edge.multicolor)
    }
}

struct NewickParser<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> NewickParser<'a> {
    fn error(&self, message: &str) -> TreeError {
        TreeError::Newick {
            offset: self.position,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.position..].chars().next()
    }

    fn at_end(&self) -> bool {
        self.position >= self.text.len()
    }

    fn skip_whitespace(&mut self) {
        while let Some(symbol) = self.peek() {
            if !symbol.is_whitespace() {
                break;
            }
            self.position += symbol.len_utf8();
        }
    }

    fn expect(&mut self, symbol: char) -> Result<(), TreeError> {
        if self.peek() == Some(symbol) {
            self.position += symbol.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{symbol}'")))
        }
    }

    fn parse_label(&mut self) -> &'a str {
        let start = self.position;
        while let Some(symbol) = self.peek() {
            if matches!(symbol, '(' | ')' | ',' | ':' | ';') {
                break;
            }
            self.position += symbol.len_utf8();
        }
        self.text[start..self.position].trim()
    }

    fn parse_length(&mut self) -> Result<f64, TreeError> {
        self.skip_whitespace();
        if self.peek() != Some(':') {
            return Ok(DEFAULT_EDGE_LENGTH);
        }
        self.position += 1;
        let start = self.position;
        let raw = self.parse_label();
        raw.parse::<f64>().map_err(|_| TreeError::Newick {
            offset: start,
            message: format!("invalid branch length {raw:?}"),
        })
    }

    fn parse_subtree(&mut self, tree: &mut BGTree, parent: Option<NodeId>) -> Result<NodeId, TreeError> {
        self.skip_whitespace();
        let id = tree.push_node("", parent, DEFAULT_EDGE_LENGTH);
        if self.peek() == Some('(') {
            self.position += 1;
            loop {
                self.parse_subtree(tree, Some(id))?;
                self.skip_whitespace();
                match self.peek() {
                    Some(',') => self.position += 1,
                    Some(')') => {
                        self.position += 1;
                        break;
                    }
                    _ => return Err(self.error("expected ',' or ')'")),
                }
            }
        }
        let name = self.parse_label();
        let dist = self.parse_length()?;
        tree.nodes[id].name = name.to_string();
        tree.nodes[id].dist = dist;
        Ok(id)
    }
}
