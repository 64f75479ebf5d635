use std::path::PathBuf;
use thiserror::Error;

use super::worker_status::ScanStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config requires at least one module, found n_modules = {0}")]
    BadModuleCount(usize),
    #[error("Config image group {0:?} does not contain the {{module}} placeholder")]
    BadImageGroup(String),
}

#[derive(Debug, Error)]
pub enum FilenameError {
    #[error("Module token {0:?} not found in file name {1:?}")]
    MissingToken(String, PathBuf),
    #[error("File name {0:?} has no room for a two digit module number after the token")]
    TruncatedName(PathBuf),
    #[error("Path {0:?} has no file name")]
    NoFileName(PathBuf),
}

#[derive(Debug, Error)]
pub enum ModuleFileError {
    #[error("Could not open module file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Module file failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("Module file failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Module file dataset {0} has unsupported shape {1:?}")]
    BadDataShape(String, Vec<usize>),
    #[error("Module file identifier list {name} has {found} entries; expected {expected}")]
    BadIdListLength {
        name: String,
        found: usize,
        expected: usize,
    },
    #[error("Module frame {0} requested but the module only has {1} frames")]
    FrameOutOfRange(usize, usize),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Module set validation was given no modules")]
    NoModules,
    #[error("Module {0} does not match the data mode (raw/processed) of module 0")]
    DataModeMismatch(usize),
}

#[derive(Debug, Error)]
pub enum FrameIndexError {
    #[error("No usable module recorded any frames; train/pulse bounds are undefined")]
    NoBounds,
    #[error("Key (train {0}, pulse {1}, module {2}) lies outside the observed index rectangle")]
    OutOfRange(u64, u64, usize),
}

#[derive(Debug, Error)]
pub enum ReadFrameError {
    #[error("Train ID {0} out of bounds [{1}, {2}]")]
    TrainOutOfBounds(u64, u64, u64),
    #[error("Pulse ID {0} out of bounds [{1}, {2}]")]
    PulseOutOfBounds(u64, u64, u64),
    #[error("Reader has no train/pulse bounds, no frames can be assembled")]
    NoBounds,
    #[error("Failed to read frame {frame} of module {module}: {source}")]
    Module {
        module: usize,
        frame: usize,
        source: ModuleFileError,
    },
    #[error("Module {module} returned a frame of shape {found:?}; expected {expected:?}")]
    BadFrameShape {
        module: usize,
        found: (usize, usize),
        expected: (usize, usize),
    },
    #[error("Frame lookup failed: {0}")]
    IndexError(#[from] FrameIndexError),
}

impl ReadFrameError {
    /// True for the failures that only concern the requested coordinates. The composite buffers
    /// are untouched and another (train, pulse) may be requested.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(
            self,
            Self::TrainOutOfBounds(..) | Self::PulseOutOfBounds(..) | Self::NoBounds
        )
    }
}

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Reader failed due to file name error: {0}")]
    FilenameError(#[from] FilenameError),
    #[error("Reader failed to open module {0}: {1}")]
    ModuleError(usize, ModuleFileError),
    #[error("Reader failed due to module validation error: {0}")]
    ValidationError(#[from] ValidationError),
    #[error("Reader failed due to configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Reader was given {0} modules; expected {1}")]
    WrongModuleCount(usize, usize),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Reader error: {0}")]
    ReaderError(#[from] ReaderError),
    #[error("Processor failed due to ReadFrame error: {0}")]
    ReadFrameError(#[from] ReadFrameError),
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<ScanStatus>),
}
