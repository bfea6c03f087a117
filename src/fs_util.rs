use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};

use camino::Utf8Path;
use flate2::read::MultiGzDecoder;
use tempfile::Builder;

use crate::error::TaxbenchError;

pub fn ensure_exists(path: &Utf8Path) -> Result<(), TaxbenchError> {
    if !path.as_std_path().exists() {
        return Err(TaxbenchError::InputNotFound(path.to_owned()));
    }
    Ok(())
}

fn read_error(path: &Utf8Path, err: io::Error) -> TaxbenchError {
    TaxbenchError::InputRead {
        path: path.to_owned(),
        message: err.to_string(),
    }
}

/// Opens a text input, decompressing it on the fly when the name ends in `.gz`.
pub fn open_text(path: &Utf8Path) -> Result<Box<dyn BufRead>, TaxbenchError> {
    ensure_exists(path)?;
    let file = File::open(path.as_std_path()).map_err(|err| read_error(path, err))?;
    if path.extension() == Some("gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub fn read_text(path: &Utf8Path) -> Result<String, TaxbenchError> {
    let mut reader = open_text(path)?;
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|err| read_error(path, err))?;
    Ok(content)
}

pub fn write_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), TaxbenchError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| TaxbenchError::Filesystem(format!("create {parent}: {err}")))?;
    let mut temp = Builder::new()
        .prefix(".taxbench")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| TaxbenchError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| TaxbenchError::Filesystem(err.to_string()))?;
    temp.as_file()
        .sync_all()
        .map_err(|err| TaxbenchError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| TaxbenchError::Filesystem(format!("persist {path}: {err}")))?;
    Ok(())
}
