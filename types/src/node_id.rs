//! Hierarchical node addressing.
//!
//! A [`NodeId`] is a non-empty path of positive integers rendered as
//! dot-joined decimal text (`1`, `1.2`, `1.2.10`). Ordering is segment-wise
//! numeric with ancestors sorting before their descendants, so `1.2 < 1.10`
//! and `1 < 1.1`. Every sort in the workspace goes through this ordering.

use std::cmp::Ordering;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeIdError {
    #[error("node id must not be empty")]
    Empty,
    #[error("node id {input:?} has an empty segment at position {position}")]
    EmptySegment { input: String, position: usize },
    #[error("node id {input:?} has non-numeric segment {segment:?}")]
    NonNumeric { input: String, segment: String },
    #[error("node id {input:?} has non-positive segment {segment:?}")]
    NonPositive { input: String, segment: String },
    #[error("node id {input:?} has segment {segment:?} with a leading zero")]
    LeadingZero { input: String, segment: String },
    #[error("node id {input:?} has segment {segment:?} that overflows u32")]
    Overflow { input: String, segment: String },
    #[error("child segment must be positive")]
    ZeroChild,
}

/// Path address of a proof node.
///
/// Zero segments are structurally unrepresentable via `NonZeroU32`, and the
/// segment list is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(Vec<NonZeroU32>);

impl NodeId {
    /// The proof root, `1`.
    #[must_use]
    pub fn root() -> Self {
        Self(vec![NonZeroU32::MIN])
    }

    pub fn parse(text: &str) -> Result<Self, NodeIdError> {
        if text.is_empty() {
            return Err(NodeIdError::Empty);
        }

        let mut segments = Vec::new();
        for (position, segment) in text.split('.').enumerate() {
            segments.push(parse_segment(text, position, segment)?);
        }
        Ok(Self(segments))
    }

    #[must_use]
    pub fn segments(&self) -> &[NonZeroU32] {
        &self.0
    }

    #[must_use]
    pub fn last_segment(&self) -> NonZeroU32 {
        // The segment list is never empty.
        self.0[self.0.len() - 1]
    }

    /// Number of segments; the root has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    #[must_use]
    pub fn child(&self, n: NonZeroU32) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(n);
        Self(segments)
    }

    pub fn try_child(&self, n: u32) -> Result<Self, NodeIdError> {
        NonZeroU32::new(n)
            .map(|n| self.child(n))
            .ok_or(NodeIdError::ZeroChild)
    }

    /// Strict ancestry: an ID is not its own ancestor.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    #[must_use]
    pub fn is_descendant_of(&self, other: &Self) -> bool {
        other.is_ancestor_of(self)
    }
}

fn parse_segment(input: &str, position: usize, segment: &str) -> Result<NonZeroU32, NodeIdError> {
    if segment.is_empty() {
        return Err(NodeIdError::EmptySegment {
            input: input.to_owned(),
            position,
        });
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NodeIdError::NonNumeric {
            input: input.to_owned(),
            segment: segment.to_owned(),
        });
    }
    if segment.bytes().all(|b| b == b'0') {
        return Err(NodeIdError::NonPositive {
            input: input.to_owned(),
            segment: segment.to_owned(),
        });
    }
    if segment.starts_with('0') {
        return Err(NodeIdError::LeadingZero {
            input: input.to_owned(),
            segment: segment.to_owned(),
        });
    }
    let value: u32 = segment.parse().map_err(|_err| NodeIdError::Overflow {
        input: input.to_owned(),
        segment: segment.to_owned(),
    })?;
    // Digits only, not all zero, no leading zero: strictly positive.
    NonZeroU32::new(value).ok_or_else(|| NodeIdError::NonPositive {
        input: input.to_owned(),
        segment: segment.to_owned(),
    })
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(&other.0) {
            match a.cmp(b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NodeId {
    type Error = NodeIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for NodeId {
    type Error = NodeIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<NodeId> for String {
    fn from(value: NodeId) -> Self {
        value.to_string()
    }
}

/// Sort IDs into canonical order in place.
pub fn sort_node_ids(ids: &mut [NodeId]) {
    ids.sort();
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::{NodeId, NodeIdError, sort_node_ids};

    fn id(text: &str) -> NodeId {
        NodeId::parse(text).expect("test fixture must be a valid node id")
    }

    #[test]
    fn parse_roundtrips_text() {
        for text in ["1", "1.2", "1.2.3", "1.10.4", "42.7", "4294967295"] {
            let parsed = id(text);
            assert_eq!(parsed.to_string(), text);
            assert_eq!(NodeId::parse(&parsed.to_string()).unwrap(), parsed);
        }
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert_eq!(NodeId::parse(""), Err(NodeIdError::Empty));
        assert!(matches!(
            NodeId::parse("1..2"),
            Err(NodeIdError::EmptySegment { position: 1, .. })
        ));
        assert!(matches!(
            NodeId::parse("1."),
            Err(NodeIdError::EmptySegment { .. })
        ));
        assert!(matches!(
            NodeId::parse(".1"),
            Err(NodeIdError::EmptySegment { position: 0, .. })
        ));
        assert!(matches!(
            NodeId::parse("1.a"),
            Err(NodeIdError::NonNumeric { .. })
        ));
        assert!(matches!(
            NodeId::parse("1.-2"),
            Err(NodeIdError::NonNumeric { .. })
        ));
        assert!(matches!(
            NodeId::parse("+1"),
            Err(NodeIdError::NonNumeric { .. })
        ));
        assert!(matches!(
            NodeId::parse("1.0"),
            Err(NodeIdError::NonPositive { .. })
        ));
        assert!(matches!(
            NodeId::parse("1.02"),
            Err(NodeIdError::LeadingZero { .. })
        ));
        assert!(matches!(
            NodeId::parse("4294967296"),
            Err(NodeIdError::Overflow { .. })
        ));
        assert!(matches!(
            NodeId::parse(" 1"),
            Err(NodeIdError::NonNumeric { .. })
        ));
    }

    #[test]
    fn ordering_is_numeric_and_depth_aware() {
        assert!(id("1.2") < id("1.10"));
        assert!(id("1") < id("1.1"));
        assert!(id("1.1.5") < id("1.2"));
        assert!(id("1.9.9") < id("1.10"));
        assert!(id("2") > id("1.999"));
        assert_eq!(id("1.2").cmp(&id("1.2")), Ordering::Equal);
    }

    #[test]
    fn sort_uses_canonical_order() {
        let mut ids = vec![id("1.10"), id("1.2"), id("1"), id("1.2.1"), id("1.1")];
        sort_node_ids(&mut ids);
        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["1", "1.1", "1.2", "1.2.1", "1.10"]);
    }

    #[test]
    fn parent_child_and_depth() {
        let node = id("1.2.3");
        assert_eq!(node.depth(), 3);
        assert_eq!(node.parent(), Some(id("1.2")));
        assert_eq!(id("1").parent(), None);
        assert!(NodeId::root().is_root());
        assert_eq!(node.try_child(7).unwrap(), id("1.2.3.7"));
        assert_eq!(node.try_child(0), Err(NodeIdError::ZeroChild));
        assert_eq!(node.last_segment().get(), 3);
    }

    #[test]
    fn ancestry_is_strict_prefix() {
        assert!(id("1").is_ancestor_of(&id("1.2.3")));
        assert!(id("1.2").is_ancestor_of(&id("1.2.3")));
        assert!(!id("1.2").is_ancestor_of(&id("1.2")));
        assert!(!id("1.2").is_ancestor_of(&id("1.20")));
        assert!(!id("1.2.3").is_ancestor_of(&id("1.2")));
        assert!(id("1.2.3").is_descendant_of(&id("1")));
    }

    #[test]
    fn serde_uses_text_form() {
        let json = serde_json::to_string(&id("1.10.2")).unwrap();
        assert_eq!(json, "\"1.10.2\"");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id("1.10.2"));
        assert!(serde_json::from_str::<NodeId>("\"1.0\"").is_err());
    }
}
