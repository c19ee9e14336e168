//! Archive extraction and binary lookup.
//!
//! Release layouts drift between versions (uv nests its binaries under
//! `uv-<triple>/`, fnm ships them at the top level), so callers never
//! assume a relative path and use [`find_binary`] instead.

use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use walkdir::WalkDir;

use crate::error::InstallError;

use super::ArchiveFormat;

/// Unpack an archive into a directory.
pub trait Unpack {
    fn unpack(&self, archive: &Path, format: ArchiveFormat, dest: &Path)
        -> Result<(), InstallError>;
}

/// Extracts tar.gz and zip archives.
pub struct ArchiveUnpacker;

impl Unpack for ArchiveUnpacker {
    fn unpack(
        &self,
        archive: &Path,
        format: ArchiveFormat,
        dest: &Path,
    ) -> Result<(), InstallError> {
        std::fs::create_dir_all(dest)
            .map_err(|e| InstallError::io(format!("failed to create {}", dest.display()), e))?;

        let result = match format {
            ArchiveFormat::TarGz => extract_tar_gz(archive, dest),
            ArchiveFormat::Zip => extract_zip(archive, dest),
        };

        result.map_err(|reason| InstallError::ArchiveExtraction {
            archive: archive.to_path_buf(),
            reason,
        })
    }
}

fn extract_tar_gz(archive_path: &Path, dest: &Path) -> Result<(), String> {
    let file = File::open(archive_path).map_err(|e| format!("failed to open archive: {e}"))?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    // `unpack` refuses entries that would escape `dest`.
    archive.unpack(dest).map_err(|e| e.to_string())
}

fn extract_zip(archive_path: &Path, dest: &Path) -> Result<(), String> {
    let file = File::open(archive_path).map_err(|e| format!("failed to open archive: {e}"))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| format!("failed to read zip archive: {e}"))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| format!("failed to read zip entry {i}: {e}"))?;

        let relative = entry
            .enclosed_name()
            .ok_or_else(|| format!("refusing unsafe entry path: {}", entry.name()))?;
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir))
        {
            return Err(format!("refusing unsafe entry path: {}", relative.display()));
        }

        let out_path = dest.join(&relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)
                .map_err(|e| format!("failed to create {}: {e}", out_path.display()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
        }
        let mut out = File::create(&out_path)
            .map_err(|e| format!("failed to create {}: {e}", out_path.display()))?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|e| format!("failed to extract {}: {e}", out_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                let _ =
                    std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode));
            }
        }
    }

    Ok(())
}

/// Search `dir` recursively for a regular file named `file_name`.
///
/// The shallowest match wins so a top-level binary beats a same-named file
/// buried in a docs or completions folder.
pub fn find_binary(dir: &Path, file_name: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && e.file_name() == file_name)
        .min_by_key(|e| e.depth())
        .map(|e| e.into_path())
}

/// Mark a file as executable (`0o755`). No-op on Windows.
pub fn make_executable(path: &Path) -> Result<(), InstallError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|e| {
            InstallError::io(
                format!("failed to mark {} executable", path.display()),
                e,
            )
        })?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

// -------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, data) in entries {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn unpacks_nested_tarball() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("uv.tar.gz");
        write_tar_gz(
            &archive,
            &[
                ("uv-x86_64-unknown-linux-gnu/uv", b"uv-binary"),
                ("uv-x86_64-unknown-linux-gnu/uvx", b"uvx-binary"),
            ],
        );

        let out = dir.path().join("out");
        ArchiveUnpacker
            .unpack(&archive, ArchiveFormat::TarGz, &out)
            .unwrap();

        let uv = find_binary(&out, "uv").expect("uv extracted");
        assert_eq!(std::fs::read(&uv).unwrap(), b"uv-binary");
        assert!(uv.ends_with("uv-x86_64-unknown-linux-gnu/uv"));
    }

    #[test]
    fn unpacks_flat_zip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("fnm.zip");
        write_zip(&archive, &[("fnm", b"fnm-binary")]);

        let out = dir.path().join("out");
        ArchiveUnpacker
            .unpack(&archive, ArchiveFormat::Zip, &out)
            .unwrap();

        assert_eq!(std::fs::read(out.join("fnm")).unwrap(), b"fnm-binary");
    }

    #[test]
    fn corrupt_archive_is_extraction_failure() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        std::fs::write(&archive, b"definitely not a zip").unwrap();

        let err = ArchiveUnpacker
            .unpack(&archive, ArchiveFormat::Zip, &dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, InstallError::ArchiveExtraction { .. }));
    }

    #[test]
    fn find_binary_prefers_shallowest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        std::fs::write(dir.path().join("a/b/c/fnm"), b"deep").unwrap();
        std::fs::write(dir.path().join("a/fnm"), b"shallow").unwrap();

        let found = find_binary(dir.path(), "fnm").unwrap();
        assert_eq!(std::fs::read(found).unwrap(), b"shallow");
    }

    #[test]
    fn find_binary_ignores_directories_and_misses() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("uv")).unwrap();
        assert!(find_binary(dir.path(), "uv").is_none());
        assert!(find_binary(dir.path(), "fnm").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn make_executable_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool");
        std::fs::write(&path, b"#!/bin/sh\n").unwrap();
        make_executable(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
