use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::audio::ExtractedFile;
use crate::error::{Result, SplitError};

const MAX_DEFLATE_LEVEL: i64 = 9;

/// Zip `files` into a new archive at `dest`, one entry per file in list order.
///
/// Files that no longer exist are skipped. Returns the number of entries written.
pub fn build_archive(files: &[ExtractedFile], dest: &Path) -> Result<usize> {
    let out = File::create(dest).map_err(|e| {
        SplitError::Archive(format!("Failed to create {}: {e}", dest.display()))
    })?;
    let mut zip = ZipWriter::new(BufWriter::new(out));

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(MAX_DEFLATE_LEVEL));

    let mut written = 0;
    for file in files {
        let source = match File::open(&file.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Skipping {}: no longer on disk", file.name);
                continue;
            }
            Err(e) => {
                return Err(SplitError::Archive(format!(
                    "Failed to open {}: {e}",
                    file.path.display()
                )))
            }
        };

        zip.start_file(file.name.as_str(), options)?;
        io::copy(&mut BufReader::new(source), &mut zip)?;
        written += 1;
    }

    let mut inner = zip.finish()?;
    io::Write::flush(&mut inner).map_err(|e| {
        SplitError::Archive(format!("Failed to finalize {}: {e}", dest.display()))
    })?;

    info!("Zipped {} file(s) into {}", written, dest.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn write_file(dir: &Path, name: &str, contents: &[u8]) -> ExtractedFile {
        let file = ExtractedFile::in_dir(dir, name);
        std::fs::write(&file.path, contents).unwrap();
        file
    }

    #[test]
    fn test_archive_contains_each_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write_file(dir.path(), "01-Intro.mp3", b"intro bytes"),
            write_file(dir.path(), "02-Chorus.mp3", &[7u8; 4096]),
        ];
        let dest = dir.path().join("Song.zip");

        let written = build_archive(&files, &dest).unwrap();
        assert_eq!(written, 2);

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"01-Intro.mp3"));
        assert!(names.contains(&"02-Chorus.mp3"));

        let mut contents = Vec::new();
        archive
            .by_name("01-Intro.mp3")
            .unwrap()
            .read_to_end(&mut contents)
            .unwrap();
        assert_eq!(contents, b"intro bytes");

        let entry = archive.by_name("02-Chorus.mp3").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        assert_eq!(entry.size(), 4096);
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write_file(dir.path(), "01-A.mp3", b"a"),
            ExtractedFile::in_dir(dir.path(), "02-B.mp3"),
            write_file(dir.path(), "03-C.mp3", b"c"),
        ];
        let dest = dir.path().join("out.zip");

        assert_eq!(build_archive(&files, &dest).unwrap(), 2);

        let archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(names.len(), 2);
        assert!(!names.contains(&"02-B.mp3"));
    }

    #[test]
    fn test_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![write_file(dir.path(), "a.mp3", b"a")];
        let dest = dir.path().join("missing-subdir").join("out.zip");

        assert!(matches!(
            build_archive(&files, &dest),
            Err(SplitError::Archive(_))
        ));
    }
}
