// jsonsift - MongoDB-style query matching for in-memory values
// Copyright (c) 2025 jsonsift contributors
// Licensed under the MIT License

//! # jsonsift
//!
//! Compile MongoDB-style query documents into reusable predicates and test
//! them against in-memory JSON-like values.
//!
//! ```
//! use jsonsift::{sift, value};
//!
//! let people = vec![
//!     value!({"name": "craig", "age": 90001}),
//!     value!({"name": "tim", "age": 33}),
//! ];
//! let young = sift(&value!({"age": {"$lt": 100}}), &people).unwrap();
//! assert_eq!(young, vec![value!({"name": "tim", "age": 33})]);
//! ```
//!
//! ## Architecture
//!
//! - `value` - Dynamic value model shared by queries and data
//! - `normalize` - Comparability projection (dates become epoch milliseconds)
//! - `registry` - Operator name table, built-ins plus user extensions
//! - `compiler` - Turns query values into `Statement` trees
//! - `ast` - Compiled statement and expression types
//! - `evaluator` - Tests data against compiled statements
//! - `functions` - Per-operator test functions
//! - `cost` - Static cost model and cheapest-first reordering
//! - `sift` - Collection filtering with selectors
//! - `datetime` - Date/time helpers
//! - `utils` - Path helpers
//!
//! Compiled statements hold `Rc` values and predicates, so they are not
//! `Send`; compile one per thread. The operator registry is shared.

pub mod ast;
pub mod compiler;
pub mod cost;
pub mod datetime;
pub mod evaluator;
pub mod functions;
pub mod normalize;
pub mod registry;
pub mod sift;
pub mod value;
mod utils;

#[cfg(feature = "python")]
mod python;

// Used by the `value!` macro.
#[doc(hidden)]
pub use indexmap;

pub use ast::{ExprKind, Expression, Matcher, Operand, Relation, Statement};
pub use compiler::{compile, compile_with, CompileOptions, Compiler, QueryError};
pub use normalize::normalize;
pub use registry::{
    default_registry, register_operator, Builtin, CustomOperator, Operator, OperatorOptions,
    OperatorRegistry,
};
pub use sift::{sift, sift_by, Selector, Sifter};
pub use value::{Pattern, PatternError, Predicate, Value, ValueType};
