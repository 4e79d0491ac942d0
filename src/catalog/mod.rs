//! Catalog data model
//!
//! A chapter is serialized as an ordered list of [`CodeNode`] trees, one per
//! root code.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One code of the catalog together with its subtree
///
/// Field order matches the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeNode {
    /// The code identifier (e.g. "O09.52")
    pub code: String,

    /// Human-readable description, possibly empty
    pub description: String,

    /// Items listed under the "Clinical Information" heading
    pub clinical_information: Vec<String>,

    /// Items listed under the "Applicable To" heading
    pub applicable_to: Vec<String>,

    /// Items listed under the "Approximate Synonyms" heading
    pub approximate_synonyms: Vec<String>,

    /// Child codes in discovery order
    pub children: Vec<CodeNode>,
}

impl CodeNode {
    /// Creates a node with no annotations and no children
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: String::new(),
            clinical_information: Vec::new(),
            applicable_to: Vec::new(),
            approximate_synonyms: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns an iterator over this node and all its descendants,
    /// depth-first in document order, paired with their depth (root = 0)
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(self, 0)],
        }
    }

    /// Total number of codes in this subtree, including this node
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    /// Always false: a node counts itself
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Checks the structural invariants of this subtree
    ///
    /// Every child code must extend its parent code and be strictly longer,
    /// and sibling codes must be pairwise distinct.
    pub fn check_invariants(&self) -> Result<(), String> {
        for (node, _) in self.walk() {
            if node.code.is_empty() {
                return Err("empty code".to_string());
            }

            let mut seen = HashSet::new();
            for child in &node.children {
                if !child.code.starts_with(&node.code) || child.code.len() <= node.code.len() {
                    return Err(format!(
                        "child {} does not extend parent {}",
                        child.code, node.code
                    ));
                }
                if !seen.insert(child.code.as_str()) {
                    return Err(format!(
                        "duplicate child {} under {}",
                        child.code, node.code
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Depth-first iterator returned by [`CodeNode::walk`]
pub struct Walk<'a> {
    stack: Vec<(&'a CodeNode, usize)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (&'a CodeNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        // Reverse so the first child is visited next
        for child in node.children.iter().rev() {
            self.stack.push((child, depth + 1));
        }
        Some((node, depth))
    }
}
