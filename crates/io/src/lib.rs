//! `modelsift-io`: turns a directory on disk (or a list of paths) into the
//! file descriptors the engine consumes.

pub mod error;
pub mod scan;

pub use error::ScanError;
pub use scan::{epoch_filename_for, read_epoch, read_path_list, scan_directory, ScanResult};
