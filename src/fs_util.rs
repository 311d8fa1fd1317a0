use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use zip::ZipArchive;

use crate::error::ChargeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Gzip,
}

impl ArchiveKind {
    pub fn detect(path: &Path) -> Result<Self, ChargeError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("zip") => Ok(ArchiveKind::Zip),
            Some(ext) if ext.eq_ignore_ascii_case("gz") => Ok(ArchiveKind::Gzip),
            _ => Err(ChargeError::UnsupportedArchive(path.display().to_string())),
        }
    }
}

pub fn ensure_dir_exists(dir: &Path) -> Result<(), ChargeError> {
    fs::create_dir_all(dir)
        .map_err(|err| ChargeError::Filesystem(format!("create {}: {err}", dir.display())))
}

/// Unpacks `archive_path` into `target_dir`, picking the format from the file
/// extension. Returns the files written.
pub fn unpack_archive(archive_path: &Path, target_dir: &Path) -> Result<Vec<PathBuf>, ChargeError> {
    let unpacked = match ArchiveKind::detect(archive_path)? {
        ArchiveKind::Zip => extract_zip(archive_path, target_dir)?,
        ArchiveKind::Gzip => vec![extract_gzip(archive_path, target_dir)?],
    };
    tracing::debug!(
        archive = %archive_path.display(),
        files = unpacked.len(),
        "unpacked archive"
    );
    Ok(unpacked)
}

/// Extracts the file entries of a zip. Every entry name is checked before
/// anything is written, so an archive with an escaping entry leaves
/// `target_dir` untouched.
pub fn extract_zip(zip_path: &Path, target_dir: &Path) -> Result<Vec<PathBuf>, ChargeError> {
    let file = fs::File::open(zip_path)
        .map_err(|err| ChargeError::Archive(format!("open zip {}: {err}", zip_path.display())))?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| ChargeError::Archive(err.to_string()))?;

    let mut files = Vec::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|err| ChargeError::Archive(err.to_string()))?;
        let relative = entry.enclosed_name().ok_or_else(|| {
            ChargeError::Archive(format!(
                "zip entry {} escapes the target directory",
                entry.name()
            ))
        })?;
        if !entry.is_dir() {
            files.push((index, target_dir.join(relative)));
        }
    }

    for (index, path) in &files {
        let mut entry = archive
            .by_index(*index)
            .map_err(|err| ChargeError::Archive(err.to_string()))?;
        if let Some(parent) = path.parent() {
            ensure_dir_exists(parent)?;
        }
        let mut outfile =
            fs::File::create(path).map_err(|err| ChargeError::Filesystem(err.to_string()))?;
        io::copy(&mut entry, &mut outfile).map_err(|err| ChargeError::Archive(err.to_string()))?;
    }
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Decompresses `name.ext.gz` into `target_dir/name.ext` and returns that path.
pub fn extract_gzip(gz_path: &Path, target_dir: &Path) -> Result<PathBuf, ChargeError> {
    let stem = gz_path
        .file_stem()
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| ChargeError::Archive(format!("no file name in {}", gz_path.display())))?;
    let output_path = target_dir.join(stem);

    let file = fs::File::open(gz_path)
        .map_err(|err| ChargeError::Archive(format!("open gzip {}: {err}", gz_path.display())))?;
    let mut decoder = GzDecoder::new(io::BufReader::new(file));
    let mut outfile = fs::File::create(&output_path)
        .map_err(|err| ChargeError::Filesystem(err.to_string()))?;
    io::copy(&mut decoder, &mut outfile).map_err(|err| ChargeError::Archive(err.to_string()))?;
    Ok(output_path)
}
