use serde::{Deserialize, Serialize};

/// Identity of a single node within one parsed tree.
///
/// Ids are handed out sequentially while parsing and by [`NodeAllocator`] for
/// nodes created afterwards. They are only meaningful inside the tree that
/// produced them and never escape to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Byte range of a node in its source text, half-open `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub id: NodeId,
}

impl Span {
    pub fn new(start: usize, end: usize, id: NodeId) -> Self {
        Self { start, end, id }
    }

    /// Span for a node that was built after parsing and has no source text
    /// of its own. Synthetic nodes are always re-emitted canonically.
    pub fn synthetic(id: NodeId) -> Self {
        Self { start: 0, end: 0, id }
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_synthetic(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

/// Hands out node ids for one tree, seeded past the ids the parser used.
#[derive(Debug, Clone)]
pub struct NodeAllocator {
    next: u32,
}

impl NodeAllocator {
    pub fn starting_at(next: u32) -> Self {
        Self { next }
    }

    pub fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    pub fn synthetic_span(&mut self) -> Span {
        Span::synthetic(self.fresh_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let span = Span::new(2, 5, NodeId(0));
        assert!(!span.contains(1));
        assert!(span.contains(2));
        assert!(span.contains(4));
        assert!(!span.contains(5));
    }

    #[test]
    fn allocator_never_repeats() {
        let mut alloc = NodeAllocator::starting_at(7);
        let a = alloc.fresh_id();
        let b = alloc.synthetic_span();
        assert_eq!(a, NodeId(7));
        assert_eq!(b.id, NodeId(8));
        assert!(b.is_synthetic());
    }
}
