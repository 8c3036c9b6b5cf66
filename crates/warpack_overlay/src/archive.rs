//! Archive extraction and WAR packing.
//!
//! Overlays are unpacked through the [`ArchiverManager`] seam so callers can
//! plug in their own extractors. [`DefaultArchiverManager`] handles every
//! zip-based format (`war`, `zip`, `jar`, `ear`, `rar`).

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};

use camino::Utf8Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{Error, Result};
use crate::scanner::DirectoryScanner;

/// Extracts an archive into a directory.
pub trait UnArchiver {
    /// Extract `source` into `destination`, creating it if needed.
    ///
    /// Existing files in `destination` are overwritten; files the archive does
    /// not contain are left alone.
    fn extract(&self, source: &Utf8Path, destination: &Utf8Path) -> Result<()>;
}

/// Maps an archive file extension to an [`UnArchiver`].
pub trait ArchiverManager {
    /// Returns [`Error::NoSuchArchiver`] when the extension is not supported.
    fn unarchiver(&self, extension: &str) -> Result<Box<dyn UnArchiver>>;
}

/// Zip-backed extraction for the standard Java archive formats.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultArchiverManager;

impl ArchiverManager for DefaultArchiverManager {
    fn unarchiver(&self, extension: &str) -> Result<Box<dyn UnArchiver>> {
        match extension.to_ascii_lowercase().as_str() {
            "war" | "zip" | "jar" | "ear" | "rar" => Ok(Box::new(ZipUnArchiver)),
            other => Err(Error::NoSuchArchiver {
                extension: other.to_string(),
            }),
        }
    }
}

/// Extracts zip archives. Entries escaping the destination are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipUnArchiver;

impl UnArchiver for ZipUnArchiver {
    fn extract(&self, source: &Utf8Path, destination: &Utf8Path) -> Result<()> {
        let file = File::open(source.as_std_path())?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;
        fs::create_dir_all(destination.as_std_path())?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let Some(relative) = entry.enclosed_name() else {
                tracing::warn!("Skipping unsafe entry '{}' in {}", entry.name(), source);
                continue;
            };
            let out_path = destination.as_std_path().join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&out_path)?;
                continue;
            }

            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out_file = BufWriter::new(File::create(&out_path)?);
            std::io::copy(&mut entry, &mut out_file)?;
            out_file.flush()?;
        }

        tracing::debug!("Extracted {} entries from {}", archive.len(), source);
        Ok(())
    }
}

const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
const WEB_XML_PATH: &str = "WEB-INF/web.xml";
const DEFAULT_MANIFEST: &str = "Manifest-Version: 1.0\r\nCreated-By: warpack\r\n\r\n";

/// Packs an assembled webapp directory into a `.war` file.
#[derive(Debug, Clone)]
pub struct WarArchiver {
    includes: Vec<String>,
    excludes: Vec<String>,
    fail_on_missing_web_xml: bool,
}

/// Summary of a written archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarSummary {
    pub files: usize,
    pub directories: usize,
}

impl Default for WarArchiver {
    fn default() -> Self {
        Self::new()
    }
}

impl WarArchiver {
    pub fn new() -> Self {
        Self {
            includes: vec!["**".to_string()],
            excludes: Vec::new(),
            fail_on_missing_web_xml: true,
        }
    }

    pub fn with_includes<S: AsRef<str>>(mut self, includes: &[S]) -> Self {
        self.includes = includes.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn with_excludes<S: AsRef<str>>(mut self, excludes: &[S]) -> Self {
        self.excludes = excludes.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn with_fail_on_missing_web_xml(mut self, fail: bool) -> Self {
        self.fail_on_missing_web_xml = fail;
        self
    }

    /// Write the selected contents of `webapp_dir` to `destination`.
    ///
    /// Entries are written in sorted order so a directory always precedes its
    /// contents. A default `META-INF/MANIFEST.MF` is added when the webapp
    /// does not provide one.
    pub fn create_archive(&self, webapp_dir: &Utf8Path, destination: &Utf8Path) -> Result<WarSummary> {
        let entries = DirectoryScanner::new(webapp_dir)
            .with_includes(&self.includes)
            .with_excludes(&self.excludes)
            .scan_with_directories()?;

        if self.fail_on_missing_web_xml
            && !(entries.contains(WEB_XML_PATH) && webapp_dir.join(WEB_XML_PATH).is_file())
        {
            return Err(Error::MissingWebXml(webapp_dir.to_path_buf()));
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent.as_std_path())?;
        }
        let writer = BufWriter::new(File::create(destination.as_std_path())?);
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);

        let mut summary = WarSummary {
            files: 0,
            directories: 0,
        };

        // The default manifest goes right after its directory entry.
        let needs_manifest = !entries.contains(MANIFEST_PATH);
        if needs_manifest && !entries.contains("META-INF") {
            zip.add_directory("META-INF/", options)?;
            summary.directories += 1;
            write_default_manifest(&mut zip, options)?;
            summary.files += 1;
        }

        for path in entries.sorted() {
            let full_path = webapp_dir.join(&path);
            if full_path.is_dir() {
                zip.add_directory(format!("{path}/"), options)?;
                summary.directories += 1;
                if needs_manifest && path == "META-INF" {
                    write_default_manifest(&mut zip, options)?;
                    summary.files += 1;
                }
            } else {
                zip.start_file(path, options)?;
                let mut file = File::open(full_path.as_std_path())?;
                std::io::copy(&mut file, &mut zip)?;
                summary.files += 1;
            }
        }

        zip.finish()?;
        tracing::info!(
            "Packed {} files and {} directories into {}",
            summary.files,
            summary.directories,
            destination
        );
        Ok(summary)
    }
}

fn write_default_manifest<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    options: SimpleFileOptions,
) -> Result<()> {
    zip.start_file(MANIFEST_PATH, options)?;
    zip.write_all(DEFAULT_MANIFEST.as_bytes())?;
    Ok(())
}
