//! Product and expectation stores
//!
//! The harness never talks to the data butler directly. Products are fetched
//! through [`ProductStore`] and archived golden documents through
//! [`ExpectationStore`]; both signal missing inputs as errors before any
//! comparison runs.
//!
//! # Directory layout
//!
//! ```text
//! <repo>/
//!   <collection>/                 e.g. ci_cpv_bias, LATISS/calib
//!     <product_type>/             e.g. verifyBiasStats
//!       <data id stem>.yaml       e.g. instrument-LATISS_detector-0.yaml
//!
//! <package>/tests/data/
//!   biasRun.yaml, biasExp.yaml, biasDet.yaml, ...
//!   legacy_202409/
//!     biasRun.yaml, ...
//! ```

mod error;
mod expectation;
mod io;
mod memory;
mod product;

pub use error::{StoreError, StoreResult};
pub use expectation::{DirectoryExpectationStore, ExpectationStore};
pub use io::{
    encode_document, load_document, parse_document, save_document, stage_document,
    DocumentFormat, StagedDocument,
};
pub use memory::MemoryProductStore;
pub use product::{DirectoryProductStore, ProductStore};
