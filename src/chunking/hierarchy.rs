//! Parent/child chunk hierarchy for expand-on-retrieval context.
//!
//! Parent spans are cut independently from the same normalized text with a
//! larger fixed token window; they are not derived from child boundaries.
//! Children map to parents positionally, with a containment check to catch
//! misassignments near parent boundaries.

use super::splitter::RecursiveSplitter;
use crate::tokenizer::SharedTokenCounter;
use std::collections::BTreeSet;
use tracing::debug;
use uuid::Uuid;

/// A coarse context span covering several child chunks.
#[derive(Debug, Clone)]
pub struct ParentChunk {
    pub id: String,
    pub content: String,
    /// Indices (into the child sequence) of the children assigned here.
    pub child_indices: BTreeSet<usize>,
}

/// Builds parent spans and assigns each child chunk to one.
pub struct HierarchyBuilder {
    parent_tokens: usize,
    counter: SharedTokenCounter,
}

impl HierarchyBuilder {
    pub fn new(counter: SharedTokenCounter, parent_tokens: usize) -> Self {
        Self {
            parent_tokens,
            counter,
        }
    }

    /// Cut parent spans over the normalized text and map every child to one.
    ///
    /// Returns the parents plus, for each child, the index of its assigned
    /// parent. The primary assignment is positional (`child / ratio`); when
    /// the assigned span does not actually contain the child's text, the
    /// other spans are scanned for one that does. A child that straddles a
    /// span boundary keeps its positional assignment.
    pub fn build(&self, normalized: &str, children: &[String]) -> (Vec<ParentChunk>, Vec<usize>) {
        if normalized.is_empty() || children.is_empty() {
            return (Vec::new(), Vec::new());
        }

        // Parents never overlap; they tile the document.
        let splitter = RecursiveSplitter::new(self.counter.clone(), self.parent_tokens, 0);
        let mut parents: Vec<ParentChunk> = splitter
            .split(normalized)
            .into_iter()
            .map(|content| ParentChunk {
                id: Uuid::new_v4().to_string(),
                content,
                child_indices: BTreeSet::new(),
            })
            .collect();

        if parents.is_empty() {
            return (Vec::new(), Vec::new());
        }

        // Roughly how many children fit in one parent span.
        let ratio = children.len().div_ceil(parents.len()).max(1);

        let mut assignment = Vec::with_capacity(children.len());
        for (i, child) in children.iter().enumerate() {
            let positional = (i / ratio).min(parents.len() - 1);

            let assigned = if parents[positional].content.contains(child.as_str()) {
                positional
            } else if let Some(containing) = parents
                .iter()
                .position(|p| p.content.contains(child.as_str()))
            {
                debug!(
                    child = i,
                    from = positional,
                    to = containing,
                    "reassigned child to containing parent span"
                );
                containing
            } else {
                positional
            };

            parents[assigned].child_indices.insert(i);
            assignment.push(assigned);
        }

        (parents, assignment)
    }
}
