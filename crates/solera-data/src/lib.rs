#![doc(issue_tracker_base_url = "https://github.com/factordynamics/solera/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! File-backed collaborators for solera.
//!
//! Everything that touches the filesystem lives here, built on polars:
//! - target registry, wide label tables and lagged label directories
//! - the feature file and the calendar it serves
//! - [`LabelReplay`], a lagged label source for offline backtests
//! - the Parquet/CSV submission writer

pub mod features;
pub mod frame;
pub mod labels;
pub mod registry;
pub mod replay;
pub mod submission;

pub use features::{FeatureTable, calendar};
pub use labels::{
    LAGGED_LABEL_DIR, LaggedLabels, label_table_from_frame, lagged_label_file, load_label_table,
    load_lagged_labels, resolve_lagged_label_dir,
};
pub use registry::load_registry;
pub use replay::LabelReplay;
pub use submission::{SubmissionFormat, read_submission, submission_frame, write_submission};
