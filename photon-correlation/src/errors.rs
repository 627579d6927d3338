use std::io;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("File {0} does not exist.")]
    FileNotAvailable(String),
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
    #[error("{0}")]
    InvalidConfiguration(String),
    #[error("Unknown scale '{0}', expected one of linear, log, log-zero.")]
    UnknownScale(String),
    #[error("Unknown mode '{0}', expected t2 or t3.")]
    UnknownMode(String),
    #[error("Malformed record {record}: {reason}")]
    MalformedRecord { record: usize, reason: String },
    #[error("Could not allocate {0}.")]
    Allocation(String),
    #[error("Failed to write npz archive: {0}")]
    Npz(#[from] ndarray_npy::WriteNpzError),
}
