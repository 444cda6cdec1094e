//! Calibration product verification
//!
//! Three families of checks run against a [`ProductStore`](cpp_store::ProductStore):
//!
//! - **Snapshot verification**: per-run, per-exposure and per-detector
//!   statistics documents are compared against archived expectations
//!   ([`VerificationSuite`]).
//! - **Output presence**: every calibration product the pipeline is meant to
//!   write can be fetched ([`OutputCheck`]).
//! - **Frame statistics**: processed bias, dark and flat frames have the
//!   levels and noise the DMTN-101 acceptance tests require ([`FrameSuite`]).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐      ┌─────────────────┐
//! │  ProductStore   │      │ ExpectationStore│
//! │  (DATA/)        │      │ (tests/data/)   │
//! └────────┬────────┘      └────────┬────────┘
//!          │                        │
//!          └──────────┬─────────────┘
//!                     │
//!          ┌──────────▼──────────┐
//!          │ VerificationHarness │──► VerificationReport
//!          └─────────────────────┘
//! ```

pub mod error;
pub mod frame;
pub mod harness;
pub mod outputs;
pub mod report;
pub mod stats;
pub mod suite;

pub use error::ArchiveError;
pub use frame::{AmpImage, FrameCheck, FrameError, FrameSuite, MaskPlanes, ProcessedExposure};
pub use harness::VerificationHarness;
pub use outputs::OutputCheck;
pub use report::{CheckResult, Outcome, VerificationReport};
pub use suite::{Availability, Component, Level, VerificationSuite};
