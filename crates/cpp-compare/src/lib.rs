//! Structured document comparison
//!
//! Walks a freshly computed statistics document and an archived expectation
//! in lock-step. Shapes (kinds, key sets, lengths) must agree exactly;
//! numeric leaves are compared under an absolute tolerance and every other
//! leaf by strict equality.
//!
//! ```text
//!   produced ──┐
//!              ├──► compare / compare_all ──► Mismatch { path, kind, detail }
//!   expected ──┘          ▲
//!                         │
//!                     Tolerance
//! ```
//!
//! # Example
//!
//! ```
//! use cpp_compare::{compare, Tolerance};
//! use cpp_core::Document;
//!
//! let produced = Document::mapping([("mean", Document::from(0.01))]);
//! let expected = Document::mapping([("mean", Document::from(0.0))]);
//!
//! assert!(compare(&produced, &expected, Tolerance::new(0.3).unwrap()).is_ok());
//! let mismatch = compare(&produced, &expected, Tolerance::new(0.005).unwrap()).unwrap_err();
//! assert_eq!(mismatch.path.to_string(), "mean");
//! ```

mod compare;
mod report;
mod tolerance;

pub use compare::{compare, compare_all, numbers_close, CompareStrategy};
pub use report::{assert_documents_close, ComparisonReport, Mismatch, MismatchKind};
pub use tolerance::{Tolerance, ToleranceError};
