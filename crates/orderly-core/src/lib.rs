//! # orderly-core: Pure Logic for Orderly
//!
//! This crate holds everything about users, products and orders that can be
//! decided without touching storage: the domain types, money arithmetic,
//! pagination windows, the structured filter model, validation rules and the
//! failure taxonomy returned to callers.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Orderly Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Transport (HTTP handlers, CLI, exporters)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ plain arguments                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    orderly-db (Storage Layer)                   │   │
//! │  │     repositories, analytics queries, order transaction manager  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ orderly-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ pagination │  │  filter   │  │ validation│  │   │
//! │  │   │   User    │  │ PageRequest│  │ Predicate │  │   rules   │  │   │
//! │  │   │  Product  │  │   Page<T>  │  │  compile  │  │  checks   │  │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain rows (User, Product, Order) and analytical rows
//! - [`money`] - Money type with integer arithmetic
//! - [`pagination`] - Page windows and the `{data, metadata}` envelope
//! - [`filter`] - Allow-listed predicates compiled to parameterized SQL
//! - [`outcome`] - Failure kinds and the order placement outcome
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use orderly_core::pagination::{PageMetadata, PageRequest};
//!
//! let request = PageRequest::new(2, 5).unwrap();
//! assert_eq!(request.offset(), 5);
//!
//! let metadata = PageMetadata::new(6, request);
//! assert_eq!(metadata.total_pages, 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod filter;
pub mod money;
pub mod outcome;
pub mod pagination;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use filter::{Column, CompiledPredicate, Comparison, FilterValue, Operator, Predicate};
pub use money::Money;
pub use outcome::{FailureKind, OrderOutcome};
pub use pagination::{Page, PageMetadata, PageRequest};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest page a single listing or query may request.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Maximum number of comparisons a single filter may contain.
pub const MAX_PREDICATE_TERMS: usize = 32;

/// Maximum number of nodes (comparisons, groups, negations) in a filter.
pub const MAX_PREDICATE_NODES: usize = 128;

/// Maximum nesting of a filter; a lone comparison has depth 1.
pub const MAX_PREDICATE_DEPTH: usize = 16;

/// Spend threshold used when the caller does not supply one (1000.00).
pub const DEFAULT_SPEND_THRESHOLD: Money = Money::from_major_minor(1000, 0);
