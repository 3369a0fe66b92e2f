//! Chain nodes and the doubly-linked bucket chains built from them.
//!
//! Every node lives in one generational arena owned by `Chains`. The
//! `next`/`previous` links are arena keys, so a chain never owns its
//! neighbours and back-links can't form ownership cycles. Bucket heads are
//! plain `Option<NodeKey>` slots held by the map and passed in by `&mut`.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Arena key of a chain node.
    pub(crate) struct NodeKey;
}

/// One stored key/value pair plus its links within a bucket chain.
#[derive(Debug)]
pub(crate) struct Node<K, V> {
    key: K,
    value: V,
    hash: u64,
    next: Option<NodeKey>,
    previous: Option<NodeKey>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V, hash: u64) -> Self {
        Self {
            key,
            value,
            hash,
            next: None,
            previous: None,
        }
    }

    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    pub(crate) fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub(crate) fn key_and_value_mut(&mut self) -> (&K, &mut V) {
        (&self.key, &mut self.value)
    }

    /// Hash computed when the node was inserted; growth reuses it.
    pub(crate) fn hash(&self) -> u64 {
        self.hash
    }

    pub(crate) fn next(&self) -> Option<NodeKey> {
        self.next
    }

    pub(crate) fn previous(&self) -> Option<NodeKey> {
        self.previous
    }

    pub(crate) fn set_next(&mut self, next: Option<NodeKey>) {
        self.next = next;
    }

    pub(crate) fn set_previous(&mut self, previous: Option<NodeKey>) {
        self.previous = previous;
    }

    pub(crate) fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

/// Arena holding the nodes of every bucket chain of one map.
#[derive(Debug)]
pub(crate) struct Chains<K, V> {
    nodes: SlotMap<NodeKey, Node<K, V>>,
}

impl<K, V> Default for Chains<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Chains<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Number of live nodes across all chains.
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn get(&self, k: NodeKey) -> Option<&Node<K, V>> {
        self.nodes.get(k)
    }

    // Links only ever name live nodes; a miss here is a broken chain.
    pub(crate) fn node(&self, k: NodeKey) -> &Node<K, V> {
        self.nodes.get(k).expect("chain link points at a live node")
    }

    pub(crate) fn node_mut(&mut self, k: NodeKey) -> &mut Node<K, V> {
        self.nodes
            .get_mut(k)
            .expect("chain link points at a live node")
    }

    /// Walk the chain starting at `head` and return the first node matching
    /// `pred`.
    pub(crate) fn find<F>(&self, head: Option<NodeKey>, mut pred: F) -> Option<NodeKey>
    where
        F: FnMut(&Node<K, V>) -> bool,
    {
        let mut cur = head;
        while let Some(k) = cur {
            let node = self.node(k);
            if pred(node) {
                return Some(k);
            }
            cur = node.next();
        }
        None
    }

    fn tail(&self, head: Option<NodeKey>) -> Option<NodeKey> {
        let mut cur = head?;
        while let Some(next) = self.node(cur).next() {
            cur = next;
        }
        Some(cur)
    }

    // `k` must be detached: no previous, no next.
    fn link_tail(&mut self, head: &mut Option<NodeKey>, k: NodeKey) {
        match self.tail(*head) {
            None => *head = Some(k),
            Some(tail) => {
                self.node_mut(tail).set_next(Some(k));
                self.node_mut(k).set_previous(Some(tail));
            }
        }
    }

    /// Allocate a node for `(key, value)` and append it to the chain at `head`.
    pub(crate) fn push_back(
        &mut self,
        head: &mut Option<NodeKey>,
        key: K,
        value: V,
        hash: u64,
    ) -> NodeKey {
        let k = self.nodes.insert(Node::new(key, value, hash));
        self.link_tail(head, k);
        k
    }

    /// Append an existing node to the chain at `head`, dropping whatever links
    /// it carried from its old chain. The caller must have already stepped
    /// past `k` in the old chain.
    pub(crate) fn relink(&mut self, head: &mut Option<NodeKey>, k: NodeKey) {
        let node = self.node_mut(k);
        node.set_next(None);
        node.set_previous(None);
        self.link_tail(head, k);
    }

    /// Remove `k` from the chain at `head` and from the arena.
    ///
    /// The predecessor's `next` and the successor's `previous` are repaired
    /// together; removing the head moves `head` to the successor.
    pub(crate) fn unlink(&mut self, head: &mut Option<NodeKey>, k: NodeKey) -> Node<K, V> {
        let node = self
            .nodes
            .remove(k)
            .expect("unlinked node must be live");
        match node.previous() {
            Some(previous) => self.node_mut(previous).set_next(node.next()),
            None => {
                debug_assert_eq!(*head, Some(k), "node without predecessor must be the head");
                *head = node.next();
            }
        }
        if let Some(next) = node.next() {
            self.node_mut(next).set_previous(node.previous());
        }
        node
    }

    /// Drop `k` from the arena without touching its neighbours' links.
    #[cfg(test)]
    pub(crate) fn forget(&mut self, k: NodeKey) {
        self.nodes.remove(k);
    }

    pub(crate) fn iter(&self) -> slotmap::basic::Iter<'_, NodeKey, Node<K, V>> {
        self.nodes.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> slotmap::basic::IterMut<'_, NodeKey, Node<K, V>> {
        self.nodes.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(chains: &Chains<&'static str, i32>, head: Option<NodeKey>) -> Vec<&'static str> {
        let mut out = Vec::new();
        let mut cur = head;
        while let Some(k) = cur {
            let node = chains.get(k).unwrap();
            out.push(*node.key());
            cur = node.next();
        }
        out
    }

    /// Invariant: every `next` link is mirrored by the successor's `previous`,
    /// and the head has no predecessor.
    fn assert_links(chains: &Chains<&'static str, i32>, head: Option<NodeKey>) {
        let mut previous = None;
        let mut cur = head;
        while let Some(k) = cur {
            let node = chains.get(k).unwrap();
            assert_eq!(node.previous(), previous);
            previous = Some(k);
            cur = node.next();
        }
    }

    fn chain_of(keys: &[&'static str]) -> (Chains<&'static str, i32>, Option<NodeKey>, Vec<NodeKey>) {
        let mut chains = Chains::new();
        let mut head = None;
        let nodes = keys
            .iter()
            .enumerate()
            .map(|(i, k)| chains.push_back(&mut head, *k, i as i32, 0))
            .collect();
        (chains, head, nodes)
    }

    /// Invariant: `push_back` appends at the tail and links the former tail.
    #[test]
    fn push_back_appends_in_order() {
        let (chains, head, nodes) = chain_of(&["a", "b", "c"]);
        assert_eq!(head, Some(nodes[0]));
        assert_eq!(collect(&chains, head), ["a", "b", "c"]);
        assert_links(&chains, head);
        assert_eq!(chains.len(), 3);
    }

    /// Invariant: unlinking the head moves the bucket slot to the successor and
    /// clears the successor's back-link.
    #[test]
    fn unlink_head_repairs_successor() {
        let (mut chains, mut head, nodes) = chain_of(&["a", "b", "c"]);
        let removed = chains.unlink(&mut head, nodes[0]);
        assert_eq!(removed.into_parts(), ("a", 0));
        assert_eq!(head, Some(nodes[1]));
        assert_eq!(chains.get(nodes[1]).unwrap().previous(), None);
        assert_eq!(collect(&chains, head), ["b", "c"]);
        assert_links(&chains, head);
    }

    /// Invariant: unlinking a middle node splices both neighbours together.
    #[test]
    fn unlink_middle_repairs_both_neighbours() {
        let (mut chains, mut head, nodes) = chain_of(&["a", "b", "c"]);
        chains.unlink(&mut head, nodes[1]);
        assert_eq!(chains.get(nodes[0]).unwrap().next(), Some(nodes[2]));
        assert_eq!(chains.get(nodes[2]).unwrap().previous(), Some(nodes[0]));
        assert_links(&chains, head);
    }

    /// Invariant: unlinking the tail leaves the predecessor as the new tail, and
    /// unlinking the last node empties the slot.
    #[test]
    fn unlink_tail_and_last_node() {
        let (mut chains, mut head, nodes) = chain_of(&["a", "b"]);
        chains.unlink(&mut head, nodes[1]);
        assert_eq!(chains.get(nodes[0]).unwrap().next(), None);
        chains.unlink(&mut head, nodes[0]);
        assert_eq!(head, None);
        assert_eq!(chains.len(), 0);
    }

    /// Invariant: `find` walks from head and stops at the first match.
    #[test]
    fn find_walks_chain() {
        let (chains, head, nodes) = chain_of(&["a", "b", "c"]);
        assert_eq!(chains.find(head, |n| *n.key() == "c"), Some(nodes[2]));
        assert_eq!(chains.find(head, |n| *n.key() == "z"), None);
        assert_eq!(chains.find(None, |_| true), None);
    }

    /// Invariant: `relink` moves a node into another chain with fresh links.
    #[test]
    fn relink_moves_node_between_chains() {
        let (mut chains, head, nodes) = chain_of(&["a", "b"]);
        let mut other = None;
        // Step past each node before moving it, as growth does.
        let mut cur = head;
        while let Some(k) = cur {
            cur = chains.get(k).unwrap().next();
            chains.relink(&mut other, k);
        }
        assert_eq!(other, Some(nodes[0]));
        assert_eq!(collect(&chains, other), ["a", "b"]);
        assert_links(&chains, other);
    }
}
