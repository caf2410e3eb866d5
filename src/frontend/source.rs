use std::fs;
use std::path::{Path, PathBuf};

use crate::error::HannaError;

/// A Hanna source file, read whole with whitespace preserved for the lexer.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    /// Opens `path`, insisting on the `.hanna` extension before touching the
    /// filesystem.
    pub fn open(path: &Path) -> Result<Self, HannaError> {
        let extension = path.extension().and_then(|ext| ext.to_str());
        if extension != Some("hanna") {
            return Err(HannaError::File(format!(
                "wrong file extension: expected a .hanna file, got {}",
                path.display()
            )));
        }

        let text = fs::read_to_string(path).map_err(|err| {
            HannaError::File(format!(
                "unable to open source file {} for reading: {}",
                path.display(),
                err
            ))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }
}
