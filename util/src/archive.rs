//! Struct archiving functionality
//!
//! Records are written as rows of a CSV file inside the session's archive
//! directory. Any `serde::Serialize` struct with only scalar members can be
//! archived.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::path::Path;
use std::fs::{File, OpenOptions};
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while archiving.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot open the archive file: {0}")]
    FileError(std::io::Error),

    #[error("Cannot write the archive record: {0}")]
    CsvError(csv::Error),

    #[error("The archiver has not been initialised with a file")]
    NotInitialised,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session, path: P
    ) -> Result<Self, ArchiveError> {
        Self::from_file_path(session.arch_root.join(path))
    }

    /// Create a new archiver writing to the given file, truncating it if it
    /// already exists.
    pub fn from_file_path<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        // Create the parent directory if it does not exist
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(ArchiveError::FileError)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(ArchiveError::FileError)?;

        let w = WriterBuilder::new()
            .has_headers(true)
            .from_writer(file);

        Ok(Self {
            writer: Some(w)
        })
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: Serialize>(
        &mut self, record: T
    ) -> Result<(), ArchiveError> {
        match self.writer {
            Some(ref mut w) => {
                w.serialize(record).map_err(ArchiveError::CsvError)?;
                w.flush().map_err(ArchiveError::FileError)?;
            },
            None => return Err(ArchiveError::NotInitialised)
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Serialize)]
    struct Record {
        cycle: u64,
        acc_mss: f64,
    }

    #[test]
    fn test_archive_rows() {
        let path = std::env::temp_dir()
            .join("track_grid_archive_test")
            .join("records.csv");

        let mut arch = Archiver::from_file_path(&path).unwrap();
        arch.serialise(Record { cycle: 0, acc_mss: 3.0 }).unwrap();
        arch.serialise(Record { cycle: 1, acc_mss: -1.5 }).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["cycle,acc_mss", "0,3.0", "1,-1.5"]);
    }

    #[test]
    fn test_uninitialised() {
        let mut arch = Archiver::default();
        assert!(matches!(
            arch.serialise(Record { cycle: 0, acc_mss: 0.0 }),
            Err(ArchiveError::NotInitialised)
        ));
    }
}
