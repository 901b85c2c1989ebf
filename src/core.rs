//! Expression analysis, dependency chains and observable expressions.
//!
//! # Examples
//!
//! ```rust,no_run
//! use xreact::core::guard::{AccessContext, CyclicAccessGuard};
//! use xreact::core::options::TraversalOptions;
//! ```

pub use xreact_core::*;
