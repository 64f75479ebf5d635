use std::path::{Path, PathBuf};

use super::constants::{DEFAULT_MODULE_TOKEN, MODULE_NUMBER_WIDTH};
use super::error::FilenameError;

/// Derives the file of every module from the file of one module.
///
/// Naming conventions change between facilities and beamtimes, so the reader only ever asks
/// this trait for paths. Implement it to support a different convention.
pub trait ModuleNaming {
    fn module_path(&self, base_path: &Path, module: usize) -> Result<PathBuf, FilenameError>;

    /// Paths for modules `0..n_modules`
    fn module_paths(
        &self,
        base_path: &Path,
        n_modules: usize,
    ) -> Result<Vec<PathBuf>, FilenameError> {
        (0..n_modules)
            .map(|module| self.module_path(base_path, module))
            .collect()
    }
}

/// The European XFEL convention: the two characters after a token (`AGIPD`) in the file name
/// are the zero padded module number, e.g. `RAW-R0001-AGIPD07-S00000.h5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenNaming {
    token: String,
}

impl Default for TokenNaming {
    fn default() -> Self {
        Self::new(DEFAULT_MODULE_TOKEN)
    }
}

impl TokenNaming {
    pub fn new(token: &str) -> Self {
        Self {
            token: String::from(token),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl ModuleNaming for TokenNaming {
    fn module_path(&self, base_path: &Path, module: usize) -> Result<PathBuf, FilenameError> {
        // Only the file name is searched, directories often carry the detector name too
        let file_name = base_path
            .file_name()
            .ok_or_else(|| FilenameError::NoFileName(base_path.to_path_buf()))?
            .to_string_lossy();

        let pos = file_name.find(&self.token).ok_or_else(|| {
            FilenameError::MissingToken(self.token.clone(), base_path.to_path_buf())
        })?;
        let start = pos + self.token.len();
        let end = start + MODULE_NUMBER_WIDTH;
        if !file_name.is_char_boundary(end) || end > file_name.len() {
            return Err(FilenameError::TruncatedName(base_path.to_path_buf()));
        }

        let mut new_name = String::with_capacity(file_name.len());
        new_name.push_str(&file_name[..start]);
        new_name.push_str(&format!("{module:0>width$}", width = MODULE_NUMBER_WIDTH));
        new_name.push_str(&file_name[end..]);

        Ok(base_path.with_file_name(new_name))
    }
}
