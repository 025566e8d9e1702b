use ahash::RandomState;
use hashbrown::{HashMap, HashSet};

use crate::grammar::{Annotation, ParserSymbol, Symbol};
use crate::lexer::Token;

/// Node handle inside one [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Interior {
        symbol: ParserSymbol,
        children: Vec<NodeId>,
    },
    Leaf {
        token: Token,
    },
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    /// Alias symbol; `None` means the node's own symbol.
    expected: Option<Symbol>,
    annotations: Vec<Annotation>,
}

/// Arena of syntax nodes plus an optional root.
///
/// Detached nodes stay allocated until the tree is dropped; handles never
/// dangle.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an interior node; `children` get their parent link set.
    pub fn push_interior(&mut self, symbol: ParserSymbol, children: Vec<NodeId>) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        for &child in &children {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(NodeData {
            kind: NodeKind::Interior { symbol, children },
            parent: None,
            expected: None,
            annotations: Vec::new(),
        });
        id
    }

    /// Allocate a leaf node holding `token`.
    pub fn push_leaf(&mut self, token: Token) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(NodeData {
            kind: NodeKind::Leaf { token },
            parent: None,
            expected: None,
            annotations: Vec::new(),
        });
        id
    }

    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.index()].kind, NodeKind::Leaf { .. })
    }

    /// Rule symbol of an interior node.
    #[must_use]
    pub fn interior_symbol(&self, id: NodeId) -> Option<ParserSymbol> {
        match &self.nodes[id.index()].kind {
            NodeKind::Interior { symbol, .. } => Some(*symbol),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Token of a leaf node.
    #[must_use]
    pub fn token(&self, id: NodeId) -> Option<&Token> {
        match &self.nodes[id.index()].kind {
            NodeKind::Leaf { token } => Some(token),
            NodeKind::Interior { .. } => None,
        }
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.index()].kind {
            NodeKind::Interior { children, .. } => children,
            NodeKind::Leaf { .. } => &[],
        }
    }

    fn children_mut(&mut self, id: NodeId) -> Option<&mut Vec<NodeId>> {
        match &mut self.nodes[id.index()].kind {
            NodeKind::Interior { children, .. } => Some(children),
            NodeKind::Leaf { .. } => None,
        }
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// The symbol this node stands for in its parent's production: the alias
    /// when one is set (iteration wrappers, compacted chains), otherwise the
    /// node's own symbol.
    #[must_use]
    pub fn expected_symbol(&self, id: NodeId) -> Symbol {
        let node = &self.nodes[id.index()];
        if let Some(alias) = node.expected {
            return alias;
        }
        match &node.kind {
            NodeKind::Interior { symbol, .. } => Symbol::Parser(*symbol),
            NodeKind::Leaf { token } => Symbol::Lexer(token.symbol),
        }
    }

    pub fn set_expected_symbol(&mut self, id: NodeId, symbol: Symbol) {
        self.nodes[id.index()].expected = Some(symbol);
    }

    #[must_use]
    pub fn annotations(&self, id: NodeId) -> &[Annotation] {
        &self.nodes[id.index()].annotations
    }

    pub fn add_annotations(&mut self, id: NodeId, annotations: impl IntoIterator<Item = Annotation>) {
        self.nodes[id.index()].annotations.extend(annotations);
    }

    /// Whether an auxiliary wrapper node (`?`/`*`/`+`/`ITEM`).
    #[must_use]
    pub fn is_auxiliary(&self, id: NodeId) -> bool {
        self.interior_symbol(id).is_some_and(ParserSymbol::is_auxiliary)
    }

    /// Children whose [`SyntaxTree::expected_symbol`] equals `symbol`.
    #[must_use]
    pub fn children_with_symbol(&self, id: NodeId, symbol: Symbol) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.expected_symbol(child) == symbol)
            .collect()
    }

    /// The `occurrence`-th (0-based) child standing for `symbol`.
    #[must_use]
    pub fn child_at(&self, id: NodeId, symbol: Symbol, occurrence: usize) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.expected_symbol(child) == symbol)
            .nth(occurrence)
    }

    #[must_use]
    pub fn has_child(&self, id: NodeId, symbol: Symbol) -> bool {
        self.child_at(id, symbol, 0).is_some()
    }

    /// Whether `node` lies in the subtree rooted at `ancestor` (inclusive).
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node
            || self
                .children(ancestor)
                .iter()
                .any(|&child| self.contains(child, node))
    }

    /// Concatenated token text of the leaves under `id`, in order. Skipped
    /// trivia is not included.
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.index()].kind {
            NodeKind::Leaf { token } => out.push_str(&token.text),
            NodeKind::Interior { children, .. } => {
                for &child in children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Number of nodes in the subtree rooted at `id` (inclusive).
    #[must_use]
    pub fn size(&self, id: NodeId) -> usize {
        1 + self
            .children(id)
            .iter()
            .map(|&child| self.size(child))
            .sum::<usize>()
    }

    /// Number of leaves in the subtree rooted at `id`.
    #[must_use]
    pub fn terminal_count(&self, id: NodeId) -> usize {
        if self.is_leaf(id) {
            return 1;
        }
        self.children(id)
            .iter()
            .map(|&child| self.terminal_count(child))
            .sum()
    }

    /// Collapse single-child chains below the root, bottom-up.
    ///
    /// A non-auxiliary interior child with exactly one child is replaced by
    /// that grandchild, unless the grandchild is itself an auxiliary wrapper.
    /// The hoisted grandchild is aliased with the collapsed node's symbol and
    /// inherits its annotations.
    pub fn compactify(&mut self) {
        if let Some(root) = self.root {
            self.compactify_node(root);
        }
    }

    fn compactify_node(&mut self, id: NodeId) {
        for slot in 0..self.children(id).len() {
            let child = self.children(id)[slot];
            self.compactify_node(child);

            let Some(child_symbol) = self.interior_symbol(child) else {
                continue;
            };
            if child_symbol.is_auxiliary() || self.children(child).len() != 1 {
                continue;
            }
            let grandchild = self.children(child)[0];
            if self.is_auxiliary(grandchild) {
                continue;
            }

            let annotations = self.nodes[child.index()].annotations.clone();
            if let Some(children) = self.children_mut(id) {
                children[slot] = grandchild;
            }
            self.nodes[grandchild.index()].parent = Some(id);
            self.nodes[grandchild.index()].expected = Some(Symbol::Parser(child_symbol));
            self.nodes[grandchild.index()].annotations.extend(annotations);
            self.nodes[child.index()].parent = None;
        }
    }

    /// Deep-copy the subtree rooted at `id`; returns the new root.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        self.clone_subtree_tracking(id, &[]).0
    }

    /// Deep-copy the subtree rooted at `id`, reporting for each node in
    /// `tracked` (that lies inside the subtree) the id of its copy.
    pub fn clone_subtree_tracking(
        &mut self,
        id: NodeId,
        tracked: &[NodeId],
    ) -> (NodeId, HashMap<NodeId, NodeId, RandomState>) {
        let mut mapping = HashMap::default();
        let root = self.clone_rec(id, tracked, &mut mapping);
        (root, mapping)
    }

    fn clone_rec(
        &mut self,
        id: NodeId,
        tracked: &[NodeId],
        mapping: &mut HashMap<NodeId, NodeId, RandomState>,
    ) -> NodeId {
        let copy = match self.nodes[id.index()].kind.clone() {
            NodeKind::Leaf { token } => self.push_leaf(token),
            NodeKind::Interior { symbol, children } => {
                let copied: Vec<NodeId> = children
                    .into_iter()
                    .map(|child| self.clone_rec(child, tracked, mapping))
                    .collect();
                self.push_interior(symbol, copied)
            }
        };
        self.nodes[copy.index()].expected = self.nodes[id.index()].expected;
        self.nodes[copy.index()].annotations = self.nodes[id.index()].annotations.clone();
        if tracked.contains(&id) {
            mapping.insert(id, copy);
        }
        copy
    }

    /// Drop every child branch under `id` whose subtree contains none of
    /// `keep`. Detached nodes lose their parent link.
    pub fn prune_to(&mut self, id: NodeId, keep: &[NodeId]) {
        let keep: HashSet<NodeId, RandomState> = keep.iter().copied().collect();
        self.prune_to_rec(id, &keep);
    }

    fn prune_to_rec(&mut self, id: NodeId, keep: &HashSet<NodeId, RandomState>) {
        let children = self.children(id).to_vec();
        let mut retained = Vec::with_capacity(children.len());
        for child in children {
            if self.subtree_intersects(child, keep) {
                self.prune_to_rec(child, keep);
                retained.push(child);
            } else {
                self.nodes[child.index()].parent = None;
            }
        }
        if let Some(slots) = self.children_mut(id) {
            *slots = retained;
        }
    }

    /// Detach every child branch under `id` rooted at a node in `remove`.
    pub fn prune(&mut self, id: NodeId, remove: &[NodeId]) {
        let remove: HashSet<NodeId, RandomState> = remove.iter().copied().collect();
        self.prune_rec(id, &remove);
    }

    fn prune_rec(&mut self, id: NodeId, remove: &HashSet<NodeId, RandomState>) {
        let children = self.children(id).to_vec();
        let mut retained = Vec::with_capacity(children.len());
        for child in children {
            if remove.contains(&child) {
                self.nodes[child.index()].parent = None;
            } else {
                self.prune_rec(child, remove);
                retained.push(child);
            }
        }
        if let Some(slots) = self.children_mut(id) {
            *slots = retained;
        }
    }

    fn subtree_intersects(&self, id: NodeId, set: &HashSet<NodeId, RandomState>) -> bool {
        set.contains(&id)
            || self
                .children(id)
                .iter()
                .any(|&child| self.subtree_intersects(child, set))
    }

    /// Substitute `new` for `old` in `old`'s parent (or as the root).
    pub fn replace_with(&mut self, old: NodeId, new: NodeId) {
        if let Some(parent) = self.nodes[old.index()].parent {
            if let Some(children) = self.children_mut(parent) {
                for slot in children {
                    if *slot == old {
                        *slot = new;
                        break;
                    }
                }
            }
            self.nodes[new.index()].parent = Some(parent);
        } else if self.root == Some(old) {
            self.root = Some(new);
            self.nodes[new.index()].parent = None;
        }
        self.nodes[old.index()].parent = None;
    }

    /// Rewrite all parent links in the subtree rooted at `root`.
    pub fn set_parent_references(&mut self, root: NodeId) {
        self.nodes[root.index()].parent = None;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            for slot in 0..self.children(id).len() {
                let child = self.children(id)[slot];
                self.nodes[child.index()].parent = Some(id);
                stack.push(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::LexerSymbol;
    use crate::lexer::SourcePosition;

    fn leaf_token(text: &str) -> Token {
        Token::new(
            LexerSymbol(1),
            text,
            SourcePosition::START,
            SourcePosition::START,
        )
    }

    // Rule symbols; ids below 4 are reserved for wrappers.
    const EXPR: ParserSymbol = ParserSymbol(4);
    const TERM: ParserSymbol = ParserSymbol(5);

    fn chain_tree() -> (SyntaxTree, NodeId, NodeId, NodeId) {
        // EXPR > TERM > leaf
        let mut tree = SyntaxTree::new();
        let leaf = tree.push_leaf(leaf_token("1"));
        let term = tree.push_interior(TERM, vec![leaf]);
        let expr = tree.push_interior(EXPR, vec![term]);
        tree.set_root(Some(expr));
        (tree, expr, term, leaf)
    }

    #[test]
    fn queries_walk_the_structure() {
        let (tree, expr, term, leaf) = chain_tree();
        assert_eq!(tree.children(expr), &[term]);
        assert_eq!(tree.parent(leaf), Some(term));
        assert_eq!(tree.interior_symbol(expr), Some(EXPR));
        assert!(tree.contains(expr, leaf));
        assert!(!tree.contains(term, expr));
        assert_eq!(tree.text(expr), "1");
        assert_eq!(tree.size(expr), 3);
        assert_eq!(tree.terminal_count(expr), 1);
    }

    #[test]
    fn compactify_hoists_single_children() {
        let (mut tree, expr, _term, leaf) = chain_tree();
        tree.compactify();
        assert_eq!(tree.children(expr), &[leaf]);
        assert_eq!(tree.parent(leaf), Some(expr));
        assert_eq!(tree.expected_symbol(leaf), Symbol::Parser(TERM));
    }

    #[test]
    fn compactify_keeps_auxiliary_wrappers() {
        let mut tree = SyntaxTree::new();
        let leaf = tree.push_leaf(leaf_token("x"));
        let item = tree.push_interior(ParserSymbol::LIST_ITEM, vec![leaf]);
        let star = tree.push_interior(ParserSymbol::STAR, vec![item]);
        let expr = tree.push_interior(EXPR, vec![star]);
        tree.set_root(Some(expr));

        tree.compactify();
        // Wrapper chain untouched: neither * nor ITEM may be hoisted away.
        assert_eq!(tree.children(expr), &[star]);
        assert_eq!(tree.children(star), &[item]);
    }

    #[test]
    fn clone_tracks_designated_nodes() {
        let (mut tree, expr, term, leaf) = chain_tree();
        let (copy, mapping) = tree.clone_subtree_tracking(expr, &[leaf]);

        assert_ne!(copy, expr);
        assert_eq!(tree.text(copy), "1");
        assert_eq!(tree.size(copy), 3);
        let leaf_copy = mapping[&leaf];
        assert_ne!(leaf_copy, leaf);
        assert!(tree.contains(copy, leaf_copy));
        assert!(!tree.contains(copy, leaf));
        // Original untouched.
        assert_eq!(tree.children(expr), &[term]);
    }

    #[test]
    fn prune_to_keeps_only_covering_branches() {
        let mut tree = SyntaxTree::new();
        let a = tree.push_leaf(leaf_token("a"));
        let b = tree.push_leaf(leaf_token("b"));
        let left = tree.push_interior(TERM, vec![a]);
        let right = tree.push_interior(TERM, vec![b]);
        let root = tree.push_interior(EXPR, vec![left, right]);
        tree.set_root(Some(root));

        tree.prune_to(root, &[b]);
        assert_eq!(tree.children(root), &[right]);
        assert_eq!(tree.parent(left), None);
        assert_eq!(tree.children(right), &[b]);
    }

    #[test]
    fn prune_detaches_listed_branches() {
        let mut tree = SyntaxTree::new();
        let a = tree.push_leaf(leaf_token("a"));
        let b = tree.push_leaf(leaf_token("b"));
        let left = tree.push_interior(TERM, vec![a]);
        let right = tree.push_interior(TERM, vec![b]);
        let root = tree.push_interior(EXPR, vec![left, right]);
        tree.set_root(Some(root));

        tree.prune(root, &[left]);
        assert_eq!(tree.children(root), &[right]);
        assert_eq!(tree.parent(left), None);
    }

    #[test]
    fn replace_with_swaps_the_child_slot() {
        let (mut tree, expr, term, _leaf) = chain_tree();
        let replacement = tree.push_leaf(leaf_token("2"));
        tree.replace_with(term, replacement);

        assert_eq!(tree.children(expr), &[replacement]);
        assert_eq!(tree.parent(replacement), Some(expr));
        assert_eq!(tree.parent(term), None);
        assert_eq!(tree.text(expr), "2");
    }

    #[test]
    fn replace_with_at_the_root() {
        let (mut tree, expr, term, _leaf) = chain_tree();
        tree.replace_with(expr, term);
        assert_eq!(tree.root(), Some(term));
        assert_eq!(tree.parent(term), None);
    }

    #[test]
    fn children_with_symbol_matches_aliases() {
        let mut tree = SyntaxTree::new();
        let leaf = tree.push_leaf(leaf_token("x"));
        let item = tree.push_interior(ParserSymbol::LIST_ITEM, vec![leaf]);
        tree.set_expected_symbol(item, Symbol::Parser(TERM));
        let root = tree.push_interior(EXPR, vec![item]);

        assert_eq!(tree.children_with_symbol(root, Symbol::Parser(TERM)), vec![item]);
        assert!(tree.children_with_symbol(root, Symbol::Parser(ParserSymbol::LIST_ITEM)).is_empty());
        assert_eq!(tree.child_at(root, Symbol::Parser(TERM), 0), Some(item));
        assert_eq!(tree.child_at(root, Symbol::Parser(TERM), 1), None);
    }
}
