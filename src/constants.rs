//! USTAR layout constants
//!
//! Offsets and widths follow the POSIX.1-1988 `ustar` header as written by
//! GNU tar with `--format=ustar`.

use std::fmt::Display;

/// Every header and every content chunk occupies a multiple of this.
pub const BLOCK_SIZE: usize = 512;

/// Number of all-zero blocks that close an archive.
pub const TERMINATOR_BLOCKS: usize = 2;

pub const NAME_OFFSET: usize = 0;
pub const NAME_LEN: usize = 100;
pub const MODE_OFFSET: usize = 100;
pub const MODE_LEN: usize = 8;
pub const UID_OFFSET: usize = 108;
pub const UID_LEN: usize = 8;
pub const GID_OFFSET: usize = 116;
pub const GID_LEN: usize = 8;
pub const SIZE_OFFSET: usize = 124;
pub const SIZE_LEN: usize = 12;
pub const MTIME_OFFSET: usize = 136;
pub const MTIME_LEN: usize = 12;
pub const CHECKSUM_OFFSET: usize = 148;
pub const CHECKSUM_LEN: usize = 8;
pub const TYPEFLAG_OFFSET: usize = 156;
pub const LINKNAME_OFFSET: usize = 157;
pub const LINKNAME_LEN: usize = 100;
pub const MAGIC_OFFSET: usize = 257;
pub const MAGIC_LEN: usize = 6;
pub const VERSION_OFFSET: usize = 263;
pub const VERSION_LEN: usize = 2;
pub const UNAME_OFFSET: usize = 265;
pub const UNAME_LEN: usize = 32;
pub const GNAME_OFFSET: usize = 297;
pub const GNAME_LEN: usize = 32;
pub const DEVMAJOR_OFFSET: usize = 329;
pub const DEVMAJOR_LEN: usize = 8;
pub const DEVMINOR_OFFSET: usize = 337;
pub const DEVMINOR_LEN: usize = 8;
pub const PREFIX_OFFSET: usize = 345;
pub const PREFIX_LEN: usize = 155;

pub const USTAR_MAGIC: &[u8; MAGIC_LEN] = b"ustar\0";
pub const USTAR_VERSION: &[u8; VERSION_LEN] = b"00";

/// Largest value of an 8 byte numeric field (7 octal digits + NUL).
pub const MAX_OCTAL_8: u64 = 0o7_777_777;
/// Largest value of a 12 byte numeric field (11 octal digits + NUL).
pub const MAX_OCTAL_12: u64 = 0o77_777_777_777;

pub const DEFAULT_FILE_MODE: u32 = 0o644;
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Entry kinds the USTAR typeflag can describe.
///
/// Vendor extensions (pax `x`/`g`, GNU `L`/`K`, ...) have no variant and are
/// rejected by the reader.
#[repr(u8)]
#[derive(
    num_derive::FromPrimitive,
    Debug,
    PartialEq,
    Eq,
    Copy,
    Clone,
    Hash,
    enum_display_derive::Display,
)]
pub enum EntryType {
    Regular = b'0',
    HardLink = b'1',
    Symlink = b'2',
    CharDevice = b'3',
    BlockDevice = b'4',
    Directory = b'5',
    Fifo = b'6',
    Contiguous = b'7',
}

impl EntryType {
    /// Pre-POSIX archives mark regular files with a NUL typeflag.
    pub const LEGACY_REGULAR: u8 = 0;

    pub fn from_typeflag(typeflag: u8) -> Option<Self> {
        if typeflag == Self::LEGACY_REGULAR {
            return Some(EntryType::Regular);
        }
        num_traits::FromPrimitive::from_u8(typeflag)
    }

    pub fn typeflag(self) -> u8 {
        self as u8
    }
}
