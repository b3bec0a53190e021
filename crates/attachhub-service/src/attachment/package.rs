//! Zip packaging of a planned archive.

use std::io::{self, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::AsyncReadExt;
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use attachhub_core::config::archive::{ArchiveCompression, ArchiveConfig};
use attachhub_core::error::{AppError, ErrorKind};
use attachhub_core::result::AppResult;
use attachhub_core::traits::storage::StorageProvider;
use attachhub_entity::attachment::{ArchiveEntry, NodeKind};

/// Writes planned entries into a zip stream, one entry at a time.
#[derive(Debug, Clone)]
pub struct ZipStreamAssembler {
    storage: Arc<dyn StorageProvider>,
    chunk_size: usize,
    compression: ArchiveCompression,
}

impl ZipStreamAssembler {
    /// Creates a new assembler reading files through `storage`.
    pub fn new(storage: Arc<dyn StorageProvider>, config: &ArchiveConfig) -> Self {
        Self {
            storage,
            chunk_size: config.chunk_size_bytes.max(1),
            compression: config.compression,
        }
    }

    /// Write `entries` in order and finish the archive.
    ///
    /// Folders become `/`-suffixed directory entries. Files are copied from
    /// storage in chunks of the configured size and always carry ZIP64
    /// sizes, so no single entry is capped at 4 GiB. On any failure the sink
    /// is cut off before the central directory is written, so a failed
    /// archive never ends in a valid footer.
    pub async fn write<W>(&self, entries: &[ArchiveEntry], sink: &mut W) -> AppResult<()>
    where
        W: Write + Seek + Send,
    {
        let aborted = Arc::new(AtomicBool::new(false));
        let mut zip = ZipWriter::new(AbortableSink::new(sink, aborted.clone()));

        match self.write_entries(&mut zip, entries).await {
            Ok(bytes) => {
                zip.finish().map_err(zip_error)?;
                debug!(entries = entries.len(), bytes, "Wrote archive");
                Ok(())
            }
            Err(e) => {
                aborted.store(true, Ordering::SeqCst);
                // finalizes into the discarding sink
                drop(zip);
                warn!(error = %e, "Archive aborted");
                Err(e)
            }
        }
    }

    /// Returns the number of file content bytes copied.
    async fn write_entries<W>(
        &self,
        zip: &mut ZipWriter<W>,
        entries: &[ArchiveEntry],
    ) -> AppResult<u64>
    where
        W: Write + Seek,
    {
        let options = SimpleFileOptions::default()
            .compression_method(match self.compression {
                ArchiveCompression::Store => CompressionMethod::Stored,
                ArchiveCompression::Deflate => CompressionMethod::Deflated,
            })
            .large_file(true);
        let mut buffer = vec![0u8; self.chunk_size];
        let mut copied = 0u64;

        for entry in entries {
            match &entry.kind {
                NodeKind::Folder => {
                    zip.add_directory(entry.entry_name(), options)
                        .map_err(zip_error)?;
                }
                NodeKind::File(_) => {
                    // a missing or unreadable file is a broken store, not a bad id
                    let mut reader =
                        self.storage.open(&entry.physical_path).await.map_err(|e| {
                            AppError::with_source(
                                ErrorKind::Storage,
                                format!("Failed to open {}", entry.physical_path),
                                e,
                            )
                        })?;
                    zip.start_file(entry.entry_name(), options)
                        .map_err(zip_error)?;
                    loop {
                        let read = reader.read(&mut buffer).await.map_err(|e| {
                            AppError::with_source(
                                ErrorKind::Storage,
                                format!("Failed to read {}", entry.physical_path),
                                e,
                            )
                        })?;
                        if read == 0 {
                            break;
                        }
                        zip.write_all(&buffer[..read]).map_err(|e| {
                            AppError::with_source(
                                ErrorKind::Storage,
                                format!("Failed to write entry {}", entry.entry_name()),
                                e,
                            )
                        })?;
                        copied += read as u64;
                    }
                }
            }
        }
        Ok(copied)
    }
}

fn zip_error(e: ZipError) -> AppError {
    AppError::with_source(ErrorKind::Storage, "Zip write failed", e)
}

/// Pass-through sink that stops forwarding once `aborted` is set.
///
/// After the abort, writes are swallowed against a virtual position, so
/// the zip writer's drop-time finalization completes without anything
/// reaching `inner`.
struct AbortableSink<'a, W> {
    inner: &'a mut W,
    aborted: Arc<AtomicBool>,
    position: u64,
    end: u64,
}

impl<'a, W> AbortableSink<'a, W> {
    fn new(inner: &'a mut W, aborted: Arc<AtomicBool>) -> Self {
        Self {
            inner,
            aborted,
            position: 0,
            end: 0,
        }
    }

    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    fn moved_to(&mut self, position: u64) -> u64 {
        self.position = position;
        self.end = self.end.max(position);
        position
    }
}

impl<W: Write> Write for AbortableSink<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = if self.is_aborted() {
            buf.len()
        } else {
            self.inner.write(buf)?
        };
        self.moved_to(self.position + written as u64);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.is_aborted() {
            return Ok(());
        }
        self.inner.flush()
    }
}

impl<W: Seek> Seek for AbortableSink<'_, W> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if !self.is_aborted() {
            let position = self.inner.seek(pos)?;
            return Ok(self.moved_to(position));
        }
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => self.end.checked_add_signed(delta),
        };
        let target = target
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "seek out of range"))?;
        Ok(self.moved_to(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    use crate::attachment::archive::ArchivePlanner;
    use crate::attachment::fixtures::{content_of, ids, materialize, sample_repo};

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn has_extra_block(mut extra: &[u8], id: u16) -> bool {
        while extra.len() >= 4 {
            let block_id = u16::from_le_bytes([extra[0], extra[1]]);
            let size = u16::from_le_bytes([extra[2], extra[3]]) as usize;
            if block_id == id {
                return true;
            }
            extra = &extra[(4 + size).min(extra.len())..];
        }
        false
    }

    fn config(chunk_size_bytes: usize, compression: ArchiveCompression) -> ArchiveConfig {
        ArchiveConfig {
            chunk_size_bytes,
            compression,
        }
    }

    #[tokio::test]
    async fn test_writes_directories_and_chunked_files() {
        let repo = sample_repo();
        let (_dir, storage) = materialize(&repo).await;
        let plan = ArchivePlanner::new(repo).plan(&ids(&["110", "121"])).await.unwrap();

        // chunk smaller than any file so every copy takes several reads
        let assembler = ZipStreamAssembler::new(storage, &config(4, ArchiveCompression::Deflate));
        let mut sink = Cursor::new(Vec::new());
        assembler.write(&plan.entries, &mut sink).await.unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(sink.into_inner())).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(
            sorted,
            vec![
                "name100/name110/",
                "name100/name110/name111.xml",
                "name100/name110/name112.txt",
                "name100/name120/name121.pdf",
            ]
        );

        let mut content = String::new();
        archive
            .by_name("name100/name120/name121.pdf")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, content_of("121"));
        assert!(archive.by_name("name100/name110/").unwrap().is_dir());
    }

    #[tokio::test]
    async fn test_stored_entries_are_uncompressed() {
        let repo = sample_repo();
        let (_dir, storage) = materialize(&repo).await;
        let plan = ArchivePlanner::new(repo).plan(&ids(&["111"])).await.unwrap();

        let assembler = ZipStreamAssembler::new(storage, &config(1024, ArchiveCompression::Store));
        let mut sink = Cursor::new(Vec::new());
        assembler.write(&plan.entries, &mut sink).await.unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(sink.into_inner())).unwrap();
        let entry = archive.by_name("name111.xml").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Stored);
        assert_eq!(entry.size(), content_of("111").len() as u64);
    }

    #[tokio::test]
    async fn test_missing_file_aborts_without_footer() {
        let repo = sample_repo();
        let (_dir, storage) = materialize(&repo).await;
        let plan = ArchivePlanner::new(repo).plan(&ids(&["110"])).await.unwrap();
        storage.delete("path100/path110/path112").await.unwrap();

        let assembler = ZipStreamAssembler::new(storage, &ArchiveConfig::default());
        let mut sink = Cursor::new(Vec::new());
        let err = assembler.write(&plan.entries, &mut sink).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);

        let bytes = sink.into_inner();
        assert!(!contains(&bytes, b"PK\x01\x02"), "central directory written");
        assert!(!contains(&bytes, b"PK\x05\x06"), "end of central directory written");
        assert!(zip::ZipArchive::new(Cursor::new(bytes)).is_err());
    }

    #[tokio::test]
    async fn test_missing_single_file_is_storage_error() {
        let repo = sample_repo();
        let (_dir, storage) = materialize(&repo).await;
        let plan = ArchivePlanner::new(repo).plan(&ids(&["111"])).await.unwrap();
        storage.delete("path100/path110/path111").await.unwrap();

        let assembler = ZipStreamAssembler::new(storage, &ArchiveConfig::default());
        let err = assembler
            .write(&plan.entries, &mut Cursor::new(Vec::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
    }

    #[tokio::test]
    async fn test_file_entries_carry_zip64_sizes() {
        let repo = sample_repo();
        let (_dir, storage) = materialize(&repo).await;
        let plan = ArchivePlanner::new(repo).plan(&ids(&["111"])).await.unwrap();

        let assembler = ZipStreamAssembler::new(storage, &config(1024, ArchiveCompression::Store));
        let mut sink = Cursor::new(Vec::new());
        assembler.write(&plan.entries, &mut sink).await.unwrap();
        let bytes = sink.into_inner();

        // first local file header: name length at 26, extra length at 28
        assert_eq!(&bytes[..4], b"PK\x03\x04");
        let name_len = u16::from_le_bytes([bytes[26], bytes[27]]) as usize;
        let extra_len = u16::from_le_bytes([bytes[28], bytes[29]]) as usize;
        let extra = &bytes[30 + name_len..30 + name_len + extra_len];
        assert!(has_extra_block(extra, 0x0001), "no ZIP64 extra field");

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive
            .by_name("name111.xml")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, content_of("111"));
    }

    #[tokio::test]
    async fn test_empty_entry_list_is_an_empty_archive() {
        let repo = sample_repo();
        let (_dir, storage) = materialize(&repo).await;
        let assembler = ZipStreamAssembler::new(storage, &ArchiveConfig::default());
        let mut sink = Cursor::new(Vec::new());
        assembler.write(&[], &mut sink).await.unwrap();

        let archive = zip::ZipArchive::new(Cursor::new(sink.into_inner())).unwrap();
        assert!(archive.is_empty());
    }
}
