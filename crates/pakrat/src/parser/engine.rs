//! Packrat dispatch: memoization, FIRST pruning, seed growth for left
//! recursion, and the combinator bodies.

use ahash::RandomState;
use hashbrown::HashMap;
use smallvec::{SmallVec, smallvec};

use super::{CombinatorKind, Parser, ParserId};
use crate::grammar::{ParserSymbol, Symbol};
use crate::lexer::TokenStream;
use crate::syntax::{NodeId, SyntaxTree};

/// Syntax-tree fragments produced by one combinator.
pub(crate) type Fragments = SmallVec<[NodeId; 4]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Success {
        /// Position after the match.
        position: usize,
        fragments: Fragments,
    },
    Failure,
}

impl Outcome {
    fn empty_at(position: usize) -> Self {
        Self::Success {
            position,
            fragments: SmallVec::new(),
        }
    }
}

/// The enclosing rule reference and the position it was entered at; used to
/// detect left-recursive re-entry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ParentCtx {
    rule: Option<ParserId>,
    position: usize,
}

impl ParentCtx {
    pub(crate) const NONE: Self = Self {
        rule: None,
        position: 0,
    };
}

/// All mutable state of one parse call. The parser itself stays immutable.
pub(crate) struct ParseCtx<'a> {
    pub(crate) tokens: &'a TokenStream,
    pub(crate) len: usize,
    /// One sparse memo table per token position; positions past the end
    /// share the sentinel slot.
    pub(crate) memo: Vec<HashMap<ParserId, Outcome, RandomState>>,
    /// Seeds of in-flight left-recursion growth, keyed by rule and position.
    growing: HashMap<(ParserId, usize), Outcome, RandomState>,
    /// When unset, no syntax nodes are allocated (recognize mode).
    pub(crate) build: bool,
}

impl<'a> ParseCtx<'a> {
    pub(crate) fn new(tokens: &'a TokenStream, build: bool) -> Self {
        let len = tokens.len();
        Self {
            tokens,
            len,
            memo: vec![HashMap::default(); len + 1],
            growing: HashMap::default(),
            build,
        }
    }

    fn slot(&self, position: usize) -> usize {
        position.min(self.len)
    }
}

impl Parser {
    /// Full dispatch for one combinator at one position: growth detection,
    /// memo lookup, FIRST pruning, then the combinator body.
    pub(super) fn run(
        &self,
        id: ParserId,
        position: usize,
        parent: ParentCtx,
        ctx: &mut ParseCtx<'_>,
        tree: &mut SyntaxTree,
    ) -> Outcome {
        if parent.rule == Some(id) {
            if let Some(seed) = ctx.growing.get(&(id, position)) {
                return seed.clone();
            }
            if position == parent.position {
                return self.grow_seed(id, position, parent, ctx, tree);
            }
        }

        let slot = ctx.slot(position);
        if let Some(hit) = ctx.memo[slot].get(&id) {
            return hit.clone();
        }

        if !self.combinators[id.index()]
            .first
            .admits(ctx.tokens.at(position).symbol)
        {
            ctx.memo[slot].insert(id, Outcome::Failure);
            return Outcome::Failure;
        }

        let result = self.apply(id, position, parent, ctx, tree);
        if matches!(
            self.combinators[id.index()].kind,
            CombinatorKind::Reference { .. }
        ) {
            ctx.memo[slot].insert(id, result.clone());
        }
        result
    }

    /// Warth-style left-recursion handling. Starting from a failed seed, the
    /// rule body is re-applied; every recursive re-entry reads the current
    /// seed, so each round may consume more input. The loop stops when a
    /// round fails or stops improving and yields the *previous* seed: the
    /// suspended outer invocation of the rule body performs the final
    /// improving round itself.
    fn grow_seed(
        &self,
        id: ParserId,
        position: usize,
        parent: ParentCtx,
        ctx: &mut ParseCtx<'_>,
        tree: &mut SyntaxTree,
    ) -> Outcome {
        ctx.growing.insert((id, position), Outcome::Failure);
        let mut previous = Outcome::Failure;
        loop {
            let result = self.apply(id, position, parent, ctx, tree);
            let seed = ctx
                .growing
                .get(&(id, position))
                .cloned()
                .unwrap_or(Outcome::Failure);

            let exhausted = match (&result, &seed) {
                (Outcome::Failure, _) => true,
                (
                    Outcome::Success { position: new, .. },
                    Outcome::Success { position: best, .. },
                ) => new <= best,
                (Outcome::Success { .. }, Outcome::Failure) => false,
            };
            if exhausted {
                ctx.growing.remove(&(id, position));
                let slot = ctx.slot(position);
                ctx.memo[slot].insert(id, previous.clone());
                return previous;
            }

            previous = seed;
            ctx.growing.insert((id, position), result);
        }
    }

    fn apply(
        &self,
        id: ParserId,
        position: usize,
        parent: ParentCtx,
        ctx: &mut ParseCtx<'_>,
        tree: &mut SyntaxTree,
    ) -> Outcome {
        match &self.combinators[id.index()].kind {
            CombinatorKind::Token { symbol } => {
                let token = ctx.tokens.at(position);
                if token.symbol != *symbol {
                    return Outcome::Failure;
                }
                let fragments = if ctx.build {
                    let leaf = tree.push_leaf(token.clone());
                    self.annotate(tree, leaf, Symbol::Lexer(*symbol));
                    smallvec![leaf]
                } else {
                    SmallVec::new()
                };
                Outcome::Success {
                    position: position + 1,
                    fragments,
                }
            }

            CombinatorKind::Sequence { elements } => {
                let mut current = position;
                let mut fragments = Fragments::new();
                for &element in elements {
                    match self.run(element, current, parent, ctx, tree) {
                        Outcome::Failure => return Outcome::Failure,
                        Outcome::Success {
                            position: end,
                            fragments: element_fragments,
                        } => {
                            current = end;
                            fragments.extend(element_fragments);
                        }
                    }
                }
                Outcome::Success {
                    position: current,
                    fragments,
                }
            }

            CombinatorKind::Alternatives { branches } => {
                let lookahead = ctx.tokens.at(position).symbol;
                for &branch in branches {
                    if !self.combinators[branch.index()].first.admits(lookahead) {
                        continue;
                    }
                    if let success @ Outcome::Success { .. } =
                        self.run(branch, position, parent, ctx, tree)
                    {
                        return success;
                    }
                }
                Outcome::Failure
            }

            CombinatorKind::Optional { child, quantified } => {
                let lookahead = ctx.tokens.at(position).symbol;
                if !self.combinators[child.index()].first.admits(lookahead) {
                    return Outcome::empty_at(position);
                }
                match self.run(*child, position, parent, ctx, tree) {
                    Outcome::Success {
                        position: end,
                        fragments,
                    } => {
                        if end != position && ctx.build && self.quantifier_nodes {
                            let item = self.wrap_item(tree, fragments, *quantified);
                            let optional =
                                tree.push_interior(ParserSymbol::OPTIONAL, vec![item]);
                            Outcome::Success {
                                position: end,
                                fragments: smallvec![optional],
                            }
                        } else {
                            Outcome::Success {
                                position: end,
                                fragments,
                            }
                        }
                    }
                    Outcome::Failure => Outcome::empty_at(position),
                }
            }

            CombinatorKind::Many { child, quantified } => {
                let mut items = Fragments::new();
                let end =
                    self.iterate(*child, *quantified, position, parent, ctx, tree, &mut items);
                let fragments = if ctx.build && self.quantifier_nodes && !items.is_empty() {
                    smallvec![tree.push_interior(ParserSymbol::STAR, items.to_vec())]
                } else {
                    items
                };
                Outcome::Success {
                    position: end,
                    fragments,
                }
            }

            CombinatorKind::ManyOne { child, quantified } => {
                let Outcome::Success {
                    position: after_first,
                    fragments: first_fragments,
                } = self.run(*child, position, parent, ctx, tree)
                else {
                    return Outcome::Failure;
                };
                if after_first == position {
                    // Mandatory part consumed nothing; no wrapper.
                    return Outcome::Success {
                        position: after_first,
                        fragments: first_fragments,
                    };
                }
                let mut items: Fragments = if ctx.build && self.quantifier_nodes {
                    smallvec![self.wrap_item(tree, first_fragments, *quantified)]
                } else {
                    first_fragments
                };
                let end = self.iterate(
                    *child,
                    *quantified,
                    after_first,
                    parent,
                    ctx,
                    tree,
                    &mut items,
                );
                let fragments = if ctx.build && self.quantifier_nodes {
                    smallvec![tree.push_interior(ParserSymbol::PLUS, items.to_vec())]
                } else {
                    items
                };
                Outcome::Success {
                    position: end,
                    fragments,
                }
            }

            CombinatorKind::Reference { symbol, target } => {
                let result = self.run(
                    *target,
                    position,
                    ParentCtx {
                        rule: Some(id),
                        position,
                    },
                    ctx,
                    tree,
                );
                match result {
                    Outcome::Success {
                        position: end,
                        fragments,
                    } if ctx.build && !fragments.is_empty() => {
                        let node = tree.push_interior(*symbol, fragments.to_vec());
                        self.annotate(tree, node, Symbol::Parser(*symbol));
                        Outcome::Success {
                            position: end,
                            fragments: smallvec![node],
                        }
                    }
                    other => other,
                }
            }
        }
    }

    /// Shared repetition loop of `*` and `+`: gate on the child's FIRST set,
    /// stop on failure or a non-advancing round, wrap each round as an
    /// iteration item.
    #[allow(clippy::too_many_arguments)]
    fn iterate(
        &self,
        child: ParserId,
        quantified: Option<Symbol>,
        start: usize,
        parent: ParentCtx,
        ctx: &mut ParseCtx<'_>,
        tree: &mut SyntaxTree,
        items: &mut Fragments,
    ) -> usize {
        let mut position = start;
        loop {
            let lookahead = ctx.tokens.at(position).symbol;
            if !self.combinators[child.index()].first.admits(lookahead) {
                break;
            }
            match self.run(child, position, parent, ctx, tree) {
                Outcome::Failure => break,
                Outcome::Success {
                    position: end,
                    fragments,
                } => {
                    if end == position {
                        break;
                    }
                    position = end;
                    if ctx.build && self.quantifier_nodes {
                        let item = self.wrap_item(tree, fragments, quantified);
                        items.push(item);
                    } else {
                        items.extend(fragments);
                    }
                }
            }
        }
        position
    }

    /// Copy a symbol's production annotations onto a node.
    fn annotate(&self, tree: &mut SyntaxTree, node: NodeId, symbol: Symbol) {
        let annotations = self.symbols.annotations(symbol);
        if !annotations.is_empty() {
            tree.add_annotations(node, annotations.to_vec());
        }
    }

    /// One iteration wrapper node, aliased with the quantified symbol when
    /// the quantification ranges over a single symbol.
    fn wrap_item(
        &self,
        tree: &mut SyntaxTree,
        fragments: Fragments,
        quantified: Option<Symbol>,
    ) -> NodeId {
        let item = tree.push_interior(ParserSymbol::LIST_ITEM, fragments.to_vec());
        if let Some(symbol) = quantified {
            tree.set_expected_symbol(item, symbol);
        }
        item
    }
}
