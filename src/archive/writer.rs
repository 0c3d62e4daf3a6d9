use std::io::Write;

use super::header::{Block, Header, ZERO_BLOCK};
use super::{FileOptions, Timestamp};
use crate::constants::*;
use crate::errors::*;

/// Number of NUL bytes needed to pad `len` to a block boundary.
pub(crate) fn padding(len: usize) -> usize {
    (BLOCK_SIZE - len % BLOCK_SIZE) % BLOCK_SIZE
}

/// One buffered archive member, header already encoded.
struct Entry {
    header: Block,
    content: Vec<u8>,
}

/// Collects files and folders and serializes them into a single tar archive.
///
/// Entries are written in the order they were added. Headers are encoded
/// as soon as an entry is added, so a value that does not fit the USTAR
/// fields is reported by [`add_file`](Self::add_file) or
/// [`add_folder`](Self::add_folder) and [`write`](Self::write) cannot fail.
///
/// ```
/// # fn main() -> Result<(), ustar::Error> {
/// let mut tar = ustar::TarWriter::new();
/// tar.add_file("main.tf", "resource \"null_resource\" \"a\" {}\n", ustar::FileOptions::new().mtime(1_700_000_000u64))?
///     .add_folder("modules", ustar::FileOptions::default())?;
/// let bytes = tar.write();
/// assert_eq!(bytes.len() % 512, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct TarWriter {
    entries: Vec<Entry>,
}

impl TarWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a regular file. Text content is stored as its UTF-8 bytes.
    pub fn add_file(
        &mut self,
        name: impl Into<String>,
        content: impl Into<Vec<u8>>,
        options: impl Into<FileOptions>,
    ) -> Result<&mut Self, Error> {
        self.push(EntryType::Regular, name.into(), content.into(), options.into())
    }

    /// Append a directory entry. Folders carry no content.
    pub fn add_folder(
        &mut self,
        name: impl Into<String>,
        options: impl Into<FileOptions>,
    ) -> Result<&mut Self, Error> {
        self.push(EntryType::Directory, name.into(), Vec::new(), options.into())
    }

    fn push(
        &mut self,
        entry_type: EntryType,
        name: String,
        content: Vec<u8>,
        options: FileOptions,
    ) -> Result<&mut Self, Error> {
        let default_mode = match entry_type {
            EntryType::Directory => DEFAULT_DIR_MODE,
            _ => DEFAULT_FILE_MODE,
        };
        let header = Header {
            name,
            mode: options.mode.unwrap_or(default_mode),
            uid: options.uid,
            gid: options.gid,
            size: content.len() as u64,
            mtime: options.mtime.unwrap_or_else(Timestamp::now),
            entry_type,
            user: options.user,
            group: options.group,
        };
        let block = header.to_block()?;
        self.entries.push(Entry {
            header: block,
            content,
        });
        Ok(self)
    }

    /// Number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size in bytes of the archive [`write`](Self::write) will produce.
    pub fn archive_len(&self) -> usize {
        let members: usize = self
            .entries
            .iter()
            .map(|e| BLOCK_SIZE + e.content.len() + padding(e.content.len()))
            .sum();
        members + TERMINATOR_BLOCKS * BLOCK_SIZE
    }

    /// Serialize all entries, followed by the two end-of-archive blocks.
    pub fn write(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.archive_len());
        for entry in &self.entries {
            out.extend_from_slice(&entry.header);
            out.extend_from_slice(&entry.content);
            out.resize(out.len() + padding(entry.content.len()), 0);
        }
        for _ in 0..TERMINATOR_BLOCKS {
            out.extend_from_slice(&ZERO_BLOCK);
        }
        log::debug!(
            "wrote tar archive with {} entries ({} bytes)",
            self.entries.len(),
            out.len()
        );
        out
    }

    /// Stream the archive into `out`; produces the same bytes as [`write`](Self::write).
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), Error> {
        for entry in &self.entries {
            out.write_all(&entry.header)?;
            out.write_all(&entry.content)?;
            out.write_all(&ZERO_BLOCK[..padding(entry.content.len())])?;
        }
        for _ in 0..TERMINATOR_BLOCKS {
            out.write_all(&ZERO_BLOCK)?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixed() -> FileOptions {
        FileOptions::new().mtime(1_700_000_000u64).into()
    }

    #[test]
    fn test_padding() {
        assert_eq!(padding(0), 0);
        assert_eq!(padding(1), 511);
        assert_eq!(padding(511), 1);
        assert_eq!(padding(512), 0);
        assert_eq!(padding(513), 511);
    }

    #[test]
    fn test_empty_archive_is_two_zero_blocks() {
        let tar = TarWriter::new();
        assert!(tar.is_empty());
        assert_eq!(tar.write(), vec![0u8; 2 * BLOCK_SIZE]);
    }

    #[test]
    fn test_layout() -> Result<(), Box<dyn std::error::Error>> {
        let mut tar = TarWriter::new();
        tar.add_file("a.txt", "hello", fixed())?
            .add_file("b.bin", vec![7u8; 600], fixed())?
            .add_folder("dir", fixed())?;
        assert_eq!(tar.len(), 3);

        let out = tar.write();
        // header + 1 block, header + 2 blocks, header, terminator
        assert_eq!(out.len(), (2 + 3 + 1 + 2) * BLOCK_SIZE);
        assert_eq!(out.len(), tar.archive_len());
        assert_eq!(&out[..5], b"a.txt");
        assert_eq!(&out[BLOCK_SIZE..BLOCK_SIZE + 5], b"hello");
        assert!(out[BLOCK_SIZE + 5..2 * BLOCK_SIZE].iter().all(|b| *b == 0));
        assert_eq!(&out[2 * BLOCK_SIZE..2 * BLOCK_SIZE + 5], b"b.bin");
        assert_eq!(&out[5 * BLOCK_SIZE..5 * BLOCK_SIZE + 3], b"dir");
        assert_eq!(out[5 * BLOCK_SIZE + TYPEFLAG_OFFSET], b'5');
        assert_eq!(
            &out[5 * BLOCK_SIZE + MODE_OFFSET..5 * BLOCK_SIZE + MODE_OFFSET + MODE_LEN],
            b"0000755\0"
        );
        assert!(out[6 * BLOCK_SIZE..].iter().all(|b| *b == 0));
        Ok(())
    }

    #[test]
    fn test_write_to_matches_write() -> Result<(), Box<dyn std::error::Error>> {
        let mut tar = TarWriter::new();
        tar.add_file("notes.md", "# notes\n", fixed())?;
        let mut sink = Vec::new();
        tar.write_to(&mut sink)?;
        assert_eq!(sink, tar.write());
        Ok(())
    }

    #[test]
    fn test_rejected_entry_is_not_buffered() {
        let mut tar = TarWriter::new();
        let err = tar
            .add_file("x".repeat(101), "data", fixed())
            .err()
            .expect("name is too long");
        assert!(matches!(
            err,
            Error::Constraint(ConstraintError::NameTooLong { len: 101, .. })
        ));
        assert!(matches!(
            tar.add_folder("", fixed()),
            Err(Error::Constraint(ConstraintError::EmptyName))
        ));
        assert!(tar.is_empty());
    }

    #[test]
    fn test_mode_out_of_range() {
        let mut tar = TarWriter::new();
        let options = FileOptions::new().mode(0o10_000_000).mtime(0u64);
        assert!(matches!(
            tar.add_file("a", "", options),
            Err(Error::Constraint(ConstraintError::ValueOutOfRange {
                field: "mode",
                ..
            }))
        ));
    }
}
