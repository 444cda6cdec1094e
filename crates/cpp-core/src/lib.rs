//! Core types for calibration product verification
//!
//! This crate provides the fundamental types shared by the comparison engine,
//! the product stores and the verification harness: the dynamically-shaped
//! [`Document`], the [`DataId`] used to look products up, and the
//! [`DocPath`] breadcrumb used to report where two documents diverge.

mod data_id;
mod document;
mod path;

pub use data_id::{DataId, DataIdError};
pub use document::{Document, DocumentKind};
pub use path::{DocPath, PathSegment};

/// Instrument used by the verification data set
pub const DEFAULT_INSTRUMENT: &str = "LATISS";
