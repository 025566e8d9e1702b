//! # Concrete Syntax Trees
//!
//! Arena-backed trees produced by the parser: interior nodes carry rule
//! symbols, leaves carry tokens. Nodes are addressed by [`NodeId`] handles
//! into the owning [`SyntaxTree`], which keeps cloning and structural
//! editing cheap and safe.
//!
//! Besides queries, the tree supports the structural operations grammar
//! tooling needs: [`SyntaxTree::compactify`] to collapse single-child
//! chains, deep cloning (optionally tracking where designated nodes land),
//! keep-set and remove-set pruning, and in-place node replacement.

mod tree;

pub use tree::{NodeId, SyntaxTree};
