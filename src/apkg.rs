//! Anki package (`.apkg`) output.
//!
//! A package is a zip archive holding the SQLite collection
//! (`collection.anki2`) and a `media` manifest. This crate never ships media,
//! so the manifest is always the empty JSON object.

mod collection;

use crate::deck::Deck;
use collection::Timestamp;
use log::{debug, info};
use std::fs;
use std::io::{self, Cursor, Write};
use std::path::Path;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const COLLECTION_ENTRY: &str = "collection.anki2";
pub const MEDIA_ENTRY: &str = "media";

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("the deck has no notes")]
    EmptyDeck,
    #[error("cannot build collection: {0}")]
    Collection(#[from] rusqlite::Error),
    #[error("cannot build archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("cannot write package: {0}")]
    Io(#[from] io::Error),
}

/// Serializes `deck` and writes it to `path` in one write.
pub fn write_package(deck: &Deck, path: &Path) -> Result<(), PackageError> {
    let bytes = package_bytes(deck)?;
    fs::write(path, &bytes)?;
    info!("[APKG] Wrote {} bytes to {:?}", bytes.len(), path);

    Ok(())
}

/// The complete `.apkg` archive for `deck`, built in memory.
pub fn package_bytes(deck: &Deck) -> Result<Vec<u8>, PackageError> {
    if deck.is_empty() {
        return Err(PackageError::EmptyDeck);
    }

    let collection = collection_bytes(deck, Timestamp::now())?;
    debug!("[APKG] Collection is {} bytes", collection.len());

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(COLLECTION_ENTRY, options)?;
    zip.write_all(&collection)?;
    zip.start_file(MEDIA_ENTRY, options)?;
    zip.write_all(b"{}")?;

    Ok(zip.finish()?.into_inner())
}

fn collection_bytes(deck: &Deck, now: Timestamp) -> Result<Vec<u8>, PackageError> {
    let scratch = tempfile::tempdir()?;
    let path = scratch.path().join(COLLECTION_ENTRY);

    let conn = collection::create_collection(deck, now)?;
    collection::export_collection(&conn, &path)?;
    collection::close_collection(conn)?;

    Ok(fs::read(&path)?)
}
