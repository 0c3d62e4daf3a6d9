use std::borrow::Cow;
use std::iter::FusedIterator;

use super::header::Header;
use super::writer::padding;
use super::{ReadOptions, Timestamp};
use crate::constants::*;
use crate::errors::*;

/// One member of a parsed archive.
///
/// The content is a view into the buffer the archive was read from; nothing
/// is copied until the caller asks for an owned value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo<'a> {
    name: String,
    entry_type: EntryType,
    size: u64,
    mode: u32,
    uid: u32,
    gid: u32,
    mtime: Timestamp,
    user: String,
    group: String,
    header_offset: usize,
    content: &'a [u8],
}

impl<'a> FileInfo<'a> {
    fn new(header: Header, header_offset: usize, content: &'a [u8]) -> Self {
        FileInfo {
            name: header.name,
            entry_type: header.entry_type,
            size: header.size,
            mode: header.mode,
            uid: header.uid,
            gid: header.gid,
            mtime: header.mtime,
            user: header.user,
            group: header.group,
            header_offset,
            content,
        }
    }

    /// Path of the entry inside the archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    /// Size in bytes as recorded in the header.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Permission bits as recorded in the header.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn gid(&self) -> u32 {
        self.gid
    }

    pub fn mtime(&self) -> Timestamp {
        self.mtime
    }

    /// Owner name, empty for pre-POSIX archives.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Group name, empty for pre-POSIX archives.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Byte offset of this entry's header block within the archive.
    pub fn header_offset(&self) -> usize {
        self.header_offset
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::Regular
    }

    /// Raw content bytes, without the block padding.
    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    /// Content decoded as UTF-8; fails rather than replacing invalid sequences.
    pub fn text(&self) -> Result<&'a str, Error> {
        std::str::from_utf8(self.content).map_err(|source| Error::Utf8 {
            name: self.name.clone(),
            source,
        })
    }

    pub fn text_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.content)
    }
}

/// Forward-only scan over the members of an archive buffer.
///
/// Yields entries in archive order and stops for good after the end marker
/// or the first error. Created by [`TarReader::entries`].
pub struct Entries<'a> {
    buffer: &'a [u8],
    offset: usize,
    options: ReadOptions,
    done: bool,
}

fn is_zero(block: &[u8]) -> bool {
    block.iter().all(|b| *b == 0)
}

impl<'a> Entries<'a> {
    fn new(buffer: &'a [u8], options: &ReadOptions) -> Self {
        Entries {
            buffer,
            offset: 0,
            options: *options,
            done: false,
        }
    }

    fn next_entry(&mut self) -> Result<Option<FileInfo<'a>>, FormatError> {
        let offset = self.offset;
        let remaining = self.buffer.len() - offset;

        if remaining < BLOCK_SIZE {
            let tail = &self.buffer[offset..];
            // nothing was read yet: this is not an archive at all
            if offset == 0 {
                return Err(FormatError::Truncated {
                    offset,
                    needed: BLOCK_SIZE,
                    available: remaining,
                });
            }
            if self.options.is_strict() {
                return Err(if is_zero(tail) {
                    FormatError::MissingTerminator
                } else {
                    FormatError::Truncated {
                        offset,
                        needed: BLOCK_SIZE,
                        available: remaining,
                    }
                });
            }
            if !is_zero(tail) {
                return Err(FormatError::Truncated {
                    offset,
                    needed: BLOCK_SIZE,
                    available: remaining,
                });
            }
            log::warn!("tar archive ends at offset {} without an end marker", offset);
            return Ok(None);
        }

        let block = &self.buffer[offset..offset + BLOCK_SIZE];
        if block[0] == 0 {
            self.end_of_archive(block)?;
            return Ok(None);
        }

        let header = Header::parse(block, offset)?;
        let data_start = offset + BLOCK_SIZE;
        let available = self.buffer.len() - data_start;
        let size = usize::try_from(header.size)
            .ok()
            .filter(|size| *size <= available)
            .ok_or(FormatError::Truncated {
                offset: data_start,
                needed: usize::try_from(header.size).unwrap_or(usize::MAX),
                available,
            })?;
        let data_end = data_start + size;
        let padded_end = data_end + padding(size);

        self.offset = if padded_end <= self.buffer.len() {
            padded_end
        } else if self.options.is_strict() {
            return Err(FormatError::Truncated {
                offset: data_end,
                needed: padding(size),
                available: self.buffer.len() - data_end,
            });
        } else {
            log::warn!(
                "content padding of {:?} is cut off at offset {}",
                header.name,
                self.buffer.len()
            );
            self.buffer.len()
        };

        Ok(Some(FileInfo::new(
            header,
            offset,
            &self.buffer[data_start..data_end],
        )))
    }

    /// Checks the block that starts with NUL against the termination policy.
    ///
    /// A NUL-led block that still carries data is a damaged header, never an end marker.
    fn end_of_archive(&self, block: &[u8]) -> Result<(), FormatError> {
        if !is_zero(block) {
            return Err(FormatError::MalformedTerminator {
                offset: self.offset,
            });
        }
        if !self.options.is_strict() {
            log::debug!("end of tar archive at offset {}", self.offset);
            return Ok(());
        }
        let second = self.offset + BLOCK_SIZE;
        match self.buffer.get(second..second + BLOCK_SIZE) {
            Some(block) if is_zero(block) => {
                log::debug!("end of tar archive at offset {}", self.offset);
                Ok(())
            }
            _ => Err(FormatError::MissingTerminator),
        }
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<FileInfo<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_entry() {
            Ok(Some(info)) => Some(Ok(info)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

impl FusedIterator for Entries<'_> {}

/// A fully parsed archive.
///
/// Parsing is all-or-nothing: a malformed header anywhere in the buffer
/// fails the whole read, so a `TarReader` never holds partial results.
///
/// ```
/// # fn main() -> Result<(), ustar::Error> {
/// let mut tar = ustar::TarWriter::new();
/// tar.add_file("main.tf", "terraform {}\n", ustar::FileOptions::default())?;
/// let bytes = tar.write();
///
/// let reader = ustar::TarReader::read_file(&bytes)?;
/// assert_eq!(reader.get_text_file("main.tf")?, "terraform {}\n");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarReader<'a> {
    files: Vec<FileInfo<'a>>,
}

impl<'a> TarReader<'a> {
    /// Parse `buffer` with the default, lenient, termination policy.
    pub fn read_file(buffer: &'a [u8]) -> Result<Self, Error> {
        Self::read_file_with(buffer, &ReadOptions::default())
    }

    pub fn read_file_with(buffer: &'a [u8], options: &ReadOptions) -> Result<Self, Error> {
        let files = Self::entries(buffer, options).collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "read tar archive with {} entries ({} bytes)",
            files.len(),
            buffer.len()
        );
        Ok(TarReader { files })
    }

    /// Lazily scan `buffer`, one entry at a time.
    pub fn entries(buffer: &'a [u8], options: &ReadOptions) -> Entries<'a> {
        Entries::new(buffer, options)
    }

    /// All entries in archive order.
    pub fn file_info(&self) -> &[FileInfo<'a>] {
        &self.files
    }

    /// First entry called `name`.
    pub fn find(&self, name: &str) -> Option<&FileInfo<'a>> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn get_file(&self, name: &str) -> Result<&'a [u8], Error> {
        self.find(name)
            .map(FileInfo::content)
            .ok_or_else(|| Error::FileNotFound(name.to_string()))
    }

    pub fn get_text_file(&self, name: &str) -> Result<&'a str, Error> {
        self.find(name)
            .ok_or_else(|| Error::FileNotFound(name.to_string()))?
            .text()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_files(self) -> Vec<FileInfo<'a>> {
        self.files
    }
}

impl<'a> IntoIterator for TarReader<'a> {
    type Item = FileInfo<'a>;
    type IntoIter = std::vec::IntoIter<FileInfo<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileOptions, TarWriter, Termination};
    use pretty_assertions::assert_eq;

    fn archive() -> Vec<u8> {
        let mut tar = TarWriter::new();
        let options = || FileOptions::new().mtime(1_700_000_000u64);
        tar.add_file("one.txt", "first", options())
            .and_then(|tar| tar.add_file("two.txt", "second", options()))
            .expect("valid entries");
        tar.write()
    }

    #[test]
    fn test_entries_is_fused_after_error() {
        let mut bytes = archive();
        // corrupt the size field of the second header
        bytes[2 * BLOCK_SIZE + SIZE_OFFSET] = b'9';
        let mut entries = TarReader::entries(&bytes, &ReadOptions::default());
        assert_eq!(entries.next().map(|r| r.is_ok()), Some(true));
        assert!(matches!(entries.next(), Some(Err(Error::Format(_)))));
        assert!(entries.next().is_none());
        assert!(entries.next().is_none());
    }

    #[test]
    fn test_single_zero_block() {
        let mut bytes = archive();
        bytes.truncate(bytes.len() - BLOCK_SIZE);

        let lenient = TarReader::read_file(&bytes).expect("lenient read");
        assert_eq!(lenient.len(), 2);

        let strict = ReadOptions::new().strict();
        assert!(matches!(
            TarReader::read_file_with(&bytes, &strict),
            Err(Error::Format(FormatError::MissingTerminator))
        ));
    }

    #[test]
    fn test_missing_padding() {
        let mut bytes = archive();
        // keep "second" but drop its padding and the terminator
        bytes.truncate(3 * BLOCK_SIZE + 6);

        let reader = TarReader::read_file(&bytes).expect("lenient read");
        assert_eq!(reader.get_text_file("two.txt").ok(), Some("second"));

        let strict = ReadOptions::new().termination(Termination::Strict);
        assert!(matches!(
            TarReader::read_file_with(&bytes, &strict),
            Err(Error::Format(FormatError::Truncated { .. }))
        ));
    }

    #[test]
    fn test_content_cut_off() {
        let mut bytes = archive();
        bytes.truncate(3 * BLOCK_SIZE + 3);
        assert!(matches!(
            TarReader::read_file(&bytes),
            Err(Error::Format(FormatError::Truncated {
                offset,
                needed: 6,
                available: 3,
            })) if offset == 3 * BLOCK_SIZE
        ));
    }

    #[test]
    fn test_nonzero_tail_is_rejected() {
        let mut bytes = archive();
        bytes.truncate(4 * BLOCK_SIZE);
        bytes.extend_from_slice(b"garbage");
        assert!(matches!(
            TarReader::read_file(&bytes),
            Err(Error::Format(FormatError::Truncated { available: 7, .. }))
        ));
    }

    #[test]
    fn test_dirty_terminator_is_rejected() {
        let mut bytes = archive();
        let end = 4 * BLOCK_SIZE;
        bytes[end + 10] = 1;
        for options in [ReadOptions::new(), ReadOptions::new().strict()] {
            assert!(matches!(
                TarReader::read_file_with(&bytes, &options),
                Err(Error::Format(FormatError::MalformedTerminator { offset })) if offset == end
            ));
        }
    }

    #[test]
    fn test_lenient_single_zero_block_after_entries() -> Result<(), Box<dyn std::error::Error>> {
        let mut bytes = archive();
        bytes.truncate(5 * BLOCK_SIZE);
        // trailing garbage after the end marker is never looked at
        bytes.extend_from_slice(b"junk");
        assert_eq!(TarReader::read_file(&bytes)?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_lookup() -> Result<(), Box<dyn std::error::Error>> {
        let bytes = archive();
        let reader = TarReader::read_file(&bytes)?;
        assert_eq!(reader.get_file("one.txt")?, b"first");
        assert_eq!(reader.find("two.txt").map(FileInfo::header_offset), Some(2 * BLOCK_SIZE));
        assert!(matches!(
            reader.get_text_file("three.txt"),
            Err(Error::FileNotFound(name)) if name == "three.txt"
        ));
        Ok(())
    }

    #[test]
    fn test_invalid_utf8_text() -> Result<(), Box<dyn std::error::Error>> {
        let mut tar = TarWriter::new();
        tar.add_file("blob", vec![0xff, 0xfe, b'a'], FileOptions::new().mtime(0u64))?;
        let bytes = tar.write();
        let reader = TarReader::read_file(&bytes)?;
        let blob = &reader.file_info()[0];
        assert!(matches!(blob.text(), Err(Error::Utf8 { .. })));
        assert_eq!(blob.text_lossy(), "\u{fffd}\u{fffd}a");
        Ok(())
    }
}
