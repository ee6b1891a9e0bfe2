//! Hierarchical loop reconstruction.
//!
//! X12 expresses nesting with explicit `HL` marker segments (own id,
//! parent id, level code) rather than structural nesting. This module
//! walks a flat, transaction-scoped segment sequence and rebuilds the
//! loop tree: each marker opens a node, and every following non-marker
//! segment belongs to the most recently opened node until the next marker
//! or the end of scope.
//!
//! Nodes live in an append-only vector; parent/child links are indices
//! into that vector. The protocol guarantees a parent appears before its
//! children in file order, and the builder enforces it: linking happens
//! while markers are seen, so a forward or missing parent reference fails
//! immediately.

use std::collections::HashMap;

use document::Segment;

use crate::{text, MapError};

/// Business role of a hierarchical level, mapped from the HL level code.
///
/// The builder itself does not interpret level codes; classification is a
/// separate step consumed by the 837 mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopRole {
    /// Level 20: information source / billing provider
    BillingProvider,
    /// Level 22: subscriber
    Subscriber,
    /// Level 23: dependent patient
    Patient,
    /// Any other level code; carried, not rejected
    Other,
}

impl LoopRole {
    pub fn classify(level_code: &str) -> Self {
        match level_code {
            "20" => Self::BillingProvider,
            "22" => Self::Subscriber,
            "23" => Self::Patient,
            _ => Self::Other,
        }
    }
}

/// One node of the loop tree.
#[derive(Debug)]
pub struct LoopNode<'buf> {
    /// HL01: this loop's hierarchical id
    pub hl_id: &'buf str,
    /// HL02: parent hierarchical id; None for roots
    pub parent_id: Option<&'buf str>,
    /// HL03: hierarchical level code (uninterpreted here)
    pub level_code: &'buf str,
    /// Index of the parent node, if any
    pub parent: Option<usize>,
    /// Indices of child nodes, in file order
    pub children: Vec<usize>,
    /// Non-marker segments owned by this loop, in file order. A node may
    /// own zero segments (e.g. a loop whose only children are deeper
    /// loops); that is valid.
    pub segments: Vec<Segment<'buf>>,
}

impl<'buf> LoopNode<'buf> {
    pub fn role(&self) -> LoopRole {
        LoopRole::classify(self.level_code)
    }
}

/// The reconstructed loop tree for one transaction scope.
#[derive(Debug)]
pub struct LoopTree<'buf> {
    /// Segments appearing before the first marker (transaction header
    /// material such as BHT and submitter/receiver NM1 loops).
    pub preamble: Vec<Segment<'buf>>,
    nodes: Vec<LoopNode<'buf>>,
    roots: Vec<usize>,
}

impl<'buf> LoopTree<'buf> {
    /// Build the tree from a transaction-scoped segment slice.
    ///
    /// `marker` is the hierarchical marker identifier ("HL" for 837).
    pub fn build(segments: &[Segment<'buf>], marker: &str) -> Result<Self, MapError> {
        let mut preamble = Vec::new();
        let mut nodes: Vec<LoopNode<'buf>> = Vec::new();
        let mut roots = Vec::new();
        let mut by_id: HashMap<&'buf str, usize> = HashMap::new();

        for segment in segments {
            if segment.id != marker.as_bytes() {
                match nodes.last_mut() {
                    Some(open) => open.segments.push(*segment),
                    None => preamble.push(*segment),
                }
                continue;
            }

            let hl_id = text(segment, 1);
            let parent_raw = text(segment, 2);
            let level_code = text(segment, 3);

            if by_id.contains_key(hl_id) {
                return Err(MapError::DuplicateLoopId(hl_id.to_string()));
            }

            let index = nodes.len();
            let parent = if parent_raw.is_empty() {
                roots.push(index);
                None
            } else {
                let parent_index =
                    *by_id
                        .get(parent_raw)
                        .ok_or_else(|| MapError::UnknownParent {
                            id: hl_id.to_string(),
                            parent: parent_raw.to_string(),
                        })?;
                nodes[parent_index].children.push(index);
                Some(parent_index)
            };

            by_id.insert(hl_id, index);
            nodes.push(LoopNode {
                hl_id,
                parent_id: (!parent_raw.is_empty()).then_some(parent_raw),
                level_code,
                parent,
                children: Vec::new(),
                segments: Vec::new(),
            });
        }

        Ok(Self {
            preamble,
            nodes,
            roots,
        })
    }

    /// All nodes in file order.
    #[inline]
    pub fn nodes(&self) -> &[LoopNode<'buf>] {
        &self.nodes
    }

    #[inline]
    pub fn node(&self, index: usize) -> &LoopNode<'buf> {
        &self.nodes[index]
    }

    /// Indices of root nodes (markers with no parent reference).
    #[inline]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Child nodes of `index`, in file order.
    pub fn children(&self, index: usize) -> impl Iterator<Item = &LoopNode<'buf>> {
        self.nodes[index]
            .children
            .iter()
            .map(|&child| &self.nodes[child])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document::parse_document;

    const ISA: &str = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       *221130*1200*^*00501*000000001*0*P*:~";

    fn build(body: &str) -> Result<(usize, Vec<(String, Option<usize>, usize)>), MapError> {
        let input = format!("{ISA}{body}");
        let doc = parse_document(input.as_bytes()).unwrap();
        let tree = LoopTree::build(&doc.segments()[1..], "HL")?;
        let summary = tree
            .nodes()
            .iter()
            .map(|n| (n.hl_id.to_string(), n.parent, n.segments.len()))
            .collect();
        Ok((tree.roots().len(), summary))
    }

    #[test]
    fn groups_segments_under_open_marker() {
        let (root_count, nodes) = build(
            "HL*1**20*1~NM1*85*2*CLINIC~N3*1 MAIN ST~\
             HL*2*1*22*0~NM1*IL*1*DOE*JANE~",
        )
        .unwrap();

        assert_eq!(root_count, 1);
        assert_eq!(
            nodes,
            [
                ("1".to_string(), None, 2),
                ("2".to_string(), Some(0), 1)
            ]
        );
    }

    #[test]
    fn node_count_equals_marker_count() {
        let (_, nodes) =
            build("HL*1**20*1~HL*2*1*22*1~HL*3*2*23*0~NM1*QC*1*DOE*BABY~").unwrap();
        assert_eq!(nodes.len(), 3);
        // A loop may own zero segments.
        assert_eq!(nodes[0].2, 0);
        assert_eq!(nodes[1].2, 0);
        assert_eq!(nodes[2].2, 1);
    }

    #[test]
    fn every_parent_precedes_its_child() {
        let (_, nodes) = build("HL*1**20*1~HL*2*1*22*1~HL*3*2*23*0~").unwrap();
        for (index, (_, parent, _)) in nodes.iter().enumerate() {
            if let Some(parent) = parent {
                assert!(*parent < index);
            }
        }
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let err = build("HL*1**20*1~HL*1*1*22*0~").unwrap_err();
        assert_eq!(err, MapError::DuplicateLoopId("1".to_string()));
    }

    #[test]
    fn forward_parent_reference_is_rejected() {
        let err = build("HL*1*9*20*1~").unwrap_err();
        assert_eq!(
            err,
            MapError::UnknownParent {
                id: "1".to_string(),
                parent: "9".to_string()
            }
        );
    }

    #[test]
    fn multiple_roots_are_allowed() {
        let (root_count, nodes) = build("HL*1**20*1~HL*2**20*1~").unwrap();
        assert_eq!(root_count, 2);
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn preamble_collects_pre_marker_segments() {
        let input = format!("{ISA}BHT*0019*00*123~NM1*41*2*SUBMITTER~HL*1**20*0~");
        let doc = parse_document(input.as_bytes()).unwrap();
        let tree = LoopTree::build(&doc.segments()[1..], "HL").unwrap();

        assert_eq!(tree.preamble.len(), 2);
        assert_eq!(tree.preamble[0].id, b"BHT");
    }

    #[test]
    fn classification_maps_known_level_codes() {
        assert_eq!(LoopRole::classify("20"), LoopRole::BillingProvider);
        assert_eq!(LoopRole::classify("22"), LoopRole::Subscriber);
        assert_eq!(LoopRole::classify("23"), LoopRole::Patient);
        assert_eq!(LoopRole::classify("19"), LoopRole::Other);
    }
}
