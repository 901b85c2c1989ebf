//! Reactive objects: reactors, property cells and notifying collections.
//!
//! # Examples
//!
//! ```rust,no_run
//! # #[cfg(feature = "cells")]
//! use xreact::cells::{Property, Reactor};
//! ```

pub use xreact_cells::*;
