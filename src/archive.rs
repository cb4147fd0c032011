//! Archive assembly: named PNG buffers -> one ZIP byte stream.
//!
//! Entries are written in insertion order with stored (uncompressed) data
//! and a fixed timestamp, so finalizing an unchanged accumulation always
//! produces the same bytes.

use crate::deck::Category;
use crate::{Error, Result};
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// How entries are named inside the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingScheme {
    /// `{Category}/00_Back.png`, `{Category}/Card_{n}.png`
    FullDeck,
    /// `Mix_Card_{n}.png`, numbered across the whole hand
    MixedHand,
    /// `{Category}_Card_Back.png`, `{Category}_Card_Front_{n}.png`
    SingleCategory,
}

impl NamingScheme {
    /// `None` for the mixed hand, which has no back entries
    pub fn back_name(self, category: Category) -> Option<String> {
        match self {
            NamingScheme::FullDeck => Some(format!("{}/00_Back.png", category)),
            NamingScheme::MixedHand => None,
            NamingScheme::SingleCategory => Some(format!("{}_Card_Back.png", category)),
        }
    }

    /// `n` is 1-based within the category, `overall` 1-based across the job
    pub fn front_name(self, category: Category, n: usize, overall: usize) -> String {
        match self {
            NamingScheme::FullDeck => format!("{}/Card_{}.png", category, n),
            NamingScheme::MixedHand => format!("Mix_Card_{}.png", overall),
            NamingScheme::SingleCategory => format!("{}_Card_Front_{}.png", category, n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct ArchiveAssembler {
    entries: Vec<ArchiveEntry>,
}

impl ArchiveAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, data: Vec<u8>) -> Result<()> {
        let name = name.into();
        if name.is_empty() || name.starts_with('/') || name.split('/').any(|p| p == "..") {
            return Err(Error::Archive(format!("invalid entry name '{}'", name)));
        }
        if self.contains(&name) {
            return Err(Error::Archive(format!("duplicate entry '{}'", name)));
        }
        debug!("archive entry {} ({} bytes)", name, data.len());
        self.entries.push(ArchiveEntry { name, data });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize everything accumulated so far. Zero entries still yields a
    /// valid (empty) archive.
    pub fn finalize(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut folders: Vec<&str> = Vec::new();
        for entry in &self.entries {
            // Every ancestor gets its own entry, outermost first
            for (end, _) in entry.name.match_indices('/') {
                let folder = &entry.name[..end];
                if !folders.contains(&folder) {
                    zip.add_directory(format!("{}/", folder), entry_options(0o755))?;
                    folders.push(folder);
                }
            }
            zip.start_file(entry.name.as_str(), entry_options(0o644))?;
            zip.write_all(&entry.data)?;
        }
        let bytes = zip.finish()?.into_inner();
        info!(
            "finalized archive: {} entries, {} folders, {} bytes",
            self.entries.len(),
            folders.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Hex SHA-256 of the finalized archive
    pub fn digest(&self) -> Result<String> {
        Ok(digest_bytes(&self.finalize()?))
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        write_archive(&self.finalize()?, path)
    }
}

fn entry_options(permissions: u32) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default())
        .unix_permissions(permissions)
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Write archive bytes, creating parent directories as needed
pub fn write_archive(bytes: &[u8], path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        // Relative paths with one component have Some("") parent
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path.to_path_buf())
}
