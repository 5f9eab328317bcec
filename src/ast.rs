//! # Sieve Expression Language - Abstract Syntax Tree
//!
//! This module defines the typed Abstract Syntax Tree (AST) for the Sieve
//! expression language, a restricted, statically-typed language for
//! predicates, projections, orderings, and small query pipelines supplied
//! as runtime-configurable strings.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Typed expression nodes
//! - **[operators]** - Binary, unary, type-test, and sequence operators
//! - **[lambda]** - Parameters and the parsed-lambda packaging
//! - **[ordering]** - Ordering specifications
//!
//! ## Core Concepts
//!
//! ### Single-pass binding
//!
//! There is no untyped tree. The parser resolves identifiers, overloads,
//! and conversions while it consumes tokens, so every node here already
//! carries its static type.
//!
//! ### Implicit iteration variables
//!
//! Sequence operators like `Where` and `Any` open a nested scope whose
//! current element is reachable as `it` (innermost wins) and as `it_1`,
//! `it_2`, ... by nesting depth:
//!
//! ```text
//! resource.Any(allowed.Contains(it_1.Key))
//! ```
//!
//! ### Projections
//!
//! `new(...)` builds an anonymous record; structurally identical field
//! lists share one shape identity process-wide:
//!
//! ```text
//! new(it.Name, it.Price * it.Quantity alias Total)
//! ```
pub mod expressions;
pub mod lambda;
pub mod operators;
pub mod ordering;
pub mod tokens;

pub use expressions::Expr;
pub use lambda::{Parameter, ParsedLambda};
pub use operators::{BinOp, SeqOp, TestMode, UnOp};
pub use ordering::{Ordering, ParsedOrdering};
pub use tokens::{SpannedToken, Token};
