//! Encoding and decoding of the 512 byte USTAR header block.

use nom::IResult;
use nom::bytes::complete;

use super::Timestamp;
use crate::constants::*;
use crate::errors::*;

pub(crate) type Block = [u8; BLOCK_SIZE];

pub(crate) const ZERO_BLOCK: Block = [0; BLOCK_SIZE];

/// Decoded metadata of one archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub(crate) name: String,
    pub(crate) mode: u32,
    pub(crate) uid: u32,
    pub(crate) gid: u32,
    pub(crate) size: u64,
    pub(crate) mtime: Timestamp,
    pub(crate) entry_type: EntryType,
    pub(crate) user: String,
    pub(crate) group: String,
}

/// Splits off the next `len` bytes of the header starting at archive offset `offset`.
fn field(input: &[u8], len: usize, offset: usize) -> Result<(&[u8], &[u8]), FormatError> {
    let res: IResult<&[u8], &[u8]> = complete::take(len)(input);
    res.map_err(|_| FormatError::Truncated {
        offset,
        needed: len,
        available: input.len(),
    })
}

/// The part of a fixed-width field before its first NUL.
fn until_nul(input: &[u8]) -> &[u8] {
    let res: IResult<&[u8], &[u8]> = complete::take_till(|b: u8| b == 0)(input);
    res.map_or(input, |(_, value)| value)
}

fn trim_spaces(mut input: &[u8]) -> &[u8] {
    while let [b' ', rest @ ..] = input {
        input = rest;
    }
    while let [rest @ .., b' '] = input {
        input = rest;
    }
    input
}

/// Parses an octal numeric field. Blank fields are only accepted when `required` is false.
fn parse_octal(
    input: &[u8],
    name: &'static str,
    offset: usize,
    required: bool,
) -> Result<u64, FormatError> {
    let invalid = || FormatError::InvalidOctal {
        field: name,
        offset,
    };
    let digits = trim_spaces(until_nul(input));
    if digits.is_empty() {
        return if required { Err(invalid()) } else { Ok(0) };
    }
    digits
        .iter()
        .try_fold(0u64, |acc, &b| match b {
            b'0'..=b'7' => acc.checked_mul(8).map(|v| v + u64::from(b - b'0')),
            _ => None,
        })
        .ok_or_else(invalid)
}

fn parse_octal_u32(
    input: &[u8],
    name: &'static str,
    offset: usize,
) -> Result<u32, FormatError> {
    let value = parse_octal(input, name, offset, false)?;
    u32::try_from(value).map_err(|_| FormatError::InvalidOctal {
        field: name,
        offset,
    })
}

fn parse_text(input: &[u8], offset: usize) -> Result<String, FormatError> {
    std::str::from_utf8(until_nul(input))
        .map(str::to_owned)
        .map_err(|_| FormatError::InvalidName { offset })
}

/// Writes `value` as zero-padded octal followed by a NUL, filling `dst`.
fn write_octal(dst: &mut [u8], value: u64, name: &'static str) -> Result<(), ConstraintError> {
    let width = dst.len() - 1;
    let max = (1u64 << (3 * width)) - 1;
    if value > max {
        return Err(ConstraintError::ValueOutOfRange {
            field: name,
            value,
            max,
        });
    }
    let digits = format!("{:0width$o}", value, width = width);
    dst[..width].copy_from_slice(digits.as_bytes());
    dst[width] = 0;
    Ok(())
}

fn write_owner(dst: &mut [u8], value: &str, name: &'static str) -> Result<(), ConstraintError> {
    let bytes = value.as_bytes();
    if bytes.contains(&0) {
        return Err(ConstraintError::NulInOwnerName { field: name });
    }
    // keep room for the terminating NUL
    let max = dst.len() - 1;
    if bytes.len() > max {
        return Err(ConstraintError::OwnerNameTooLong {
            field: name,
            len: bytes.len(),
            max,
        });
    }
    dst[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}

/// Sum of all header bytes with the checksum field counted as eight spaces.
///
/// This is the value POSIX requires in the checksum field.
pub fn checksum(block: &[u8]) -> u32 {
    let cksum_range = CHECKSUM_OFFSET..CHECKSUM_OFFSET + CHECKSUM_LEN;
    block
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            if cksum_range.contains(&i) {
                u32::from(b' ')
            } else {
                u32::from(b)
            }
        })
        .sum()
}

/// Same as [`checksum`] but over signed bytes, as some historic tar implementations did.
fn signed_checksum(block: &[u8]) -> u32 {
    let cksum_range = CHECKSUM_OFFSET..CHECKSUM_OFFSET + CHECKSUM_LEN;
    let sum: i32 = block
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            if cksum_range.contains(&i) {
                i32::from(b' ')
            } else {
                i32::from(b as i8)
            }
        })
        .sum();
    sum as u32
}

impl Header {
    pub(crate) fn parse(block: &[u8], offset: usize) -> Result<Self, FormatError> {
        if block.len() < BLOCK_SIZE {
            return Err(FormatError::Truncated {
                offset,
                needed: BLOCK_SIZE,
                available: block.len(),
            });
        }

        let (rest, name) = field(block, NAME_LEN, offset)?;
        let (rest, mode) = field(rest, MODE_LEN, offset)?;
        let (rest, uid) = field(rest, UID_LEN, offset)?;
        let (rest, gid) = field(rest, GID_LEN, offset)?;
        let (rest, size) = field(rest, SIZE_LEN, offset)?;
        let (rest, mtime) = field(rest, MTIME_LEN, offset)?;
        let (rest, stored_checksum) = field(rest, CHECKSUM_LEN, offset)?;
        let (rest, typeflag) = field(rest, 1, offset)?;
        let (rest, _linkname) = field(rest, LINKNAME_LEN, offset)?;
        let (rest, magic) = field(rest, MAGIC_LEN, offset)?;
        let (rest, _version) = field(rest, VERSION_LEN, offset)?;
        let (rest, uname) = field(rest, UNAME_LEN, offset)?;
        let (rest, gname) = field(rest, GNAME_LEN, offset)?;
        let (rest, _devmajor) = field(rest, DEVMAJOR_LEN, offset)?;
        let (rest, _devminor) = field(rest, DEVMINOR_LEN, offset)?;
        let (_rest, prefix) = field(rest, PREFIX_LEN, offset)?;

        let stored = parse_octal(stored_checksum, "checksum", offset, true)?;
        let block = &block[..BLOCK_SIZE];
        let computed = checksum(block);
        if stored != u64::from(computed) && stored != u64::from(signed_checksum(block)) {
            return Err(FormatError::ChecksumMismatch {
                offset,
                stored: u32::try_from(stored).unwrap_or(u32::MAX),
                computed,
            });
        }

        let entry_type = EntryType::from_typeflag(typeflag[0]).ok_or(
            FormatError::UnsupportedEntryType {
                offset,
                typeflag: typeflag[0],
            },
        )?;

        // pre-POSIX archives carry neither owner names nor a prefix
        let is_ustar = magic.starts_with(b"ustar");
        let mut name = parse_text(name, offset)?;
        if magic == USTAR_MAGIC {
            let prefix = parse_text(prefix, offset)?;
            if !prefix.is_empty() {
                name = format!("{}/{}", prefix, name);
            }
        }
        let (user, group) = if is_ustar {
            (parse_text(uname, offset)?, parse_text(gname, offset)?)
        } else {
            (String::new(), String::new())
        };

        let header = Header {
            name,
            mode: parse_octal_u32(mode, "mode", offset)?,
            uid: parse_octal_u32(uid, "uid", offset)?,
            gid: parse_octal_u32(gid, "gid", offset)?,
            size: parse_octal(size, "size", offset, true)?,
            mtime: Timestamp(parse_octal(mtime, "mtime", offset, false)?),
            entry_type,
            user,
            group,
        };
        log::trace!(
            "decoded {} header for {:?} at offset {} ({} bytes)",
            header.entry_type,
            header.name,
            offset,
            header.size
        );
        Ok(header)
    }

    /// Encodes the header, checksum included.
    ///
    /// Fails instead of truncating when a value does not fit its field.
    pub(crate) fn to_block(&self) -> Result<Block, ConstraintError> {
        let name = self.name.as_bytes();
        if name.is_empty() {
            return Err(ConstraintError::EmptyName);
        }
        if name.contains(&0) {
            return Err(ConstraintError::NulInName(self.name.clone()));
        }
        if name.len() > NAME_LEN {
            return Err(ConstraintError::NameTooLong {
                name: self.name.clone(),
                len: name.len(),
                max: NAME_LEN,
            });
        }

        let mut block = ZERO_BLOCK;
        block[NAME_OFFSET..NAME_OFFSET + name.len()].copy_from_slice(name);
        write_octal(
            &mut block[MODE_OFFSET..MODE_OFFSET + MODE_LEN],
            self.mode.into(),
            "mode",
        )?;
        write_octal(
            &mut block[UID_OFFSET..UID_OFFSET + UID_LEN],
            self.uid.into(),
            "uid",
        )?;
        write_octal(
            &mut block[GID_OFFSET..GID_OFFSET + GID_LEN],
            self.gid.into(),
            "gid",
        )?;
        write_octal(&mut block[SIZE_OFFSET..SIZE_OFFSET + SIZE_LEN], self.size, "size")?;
        write_octal(
            &mut block[MTIME_OFFSET..MTIME_OFFSET + MTIME_LEN],
            self.mtime.as_secs(),
            "mtime",
        )?;
        block[TYPEFLAG_OFFSET] = self.entry_type.typeflag();
        block[MAGIC_OFFSET..MAGIC_OFFSET + MAGIC_LEN].copy_from_slice(USTAR_MAGIC);
        block[VERSION_OFFSET..VERSION_OFFSET + VERSION_LEN].copy_from_slice(USTAR_VERSION);
        write_owner(&mut block[UNAME_OFFSET..UNAME_OFFSET + UNAME_LEN], &self.user, "user")?;
        write_owner(&mut block[GNAME_OFFSET..GNAME_OFFSET + GNAME_LEN], &self.group, "group")?;
        write_octal(
            &mut block[DEVMAJOR_OFFSET..DEVMAJOR_OFFSET + DEVMAJOR_LEN],
            0,
            "devmajor",
        )?;
        write_octal(
            &mut block[DEVMINOR_OFFSET..DEVMINOR_OFFSET + DEVMINOR_LEN],
            0,
            "devminor",
        )?;

        // 6 octal digits, NUL, space
        let sum = checksum(&block);
        let cksum = format!("{:06o}\0 ", sum);
        block[CHECKSUM_OFFSET..CHECKSUM_OFFSET + CHECKSUM_LEN].copy_from_slice(cksum.as_bytes());

        log::trace!("encoded {} header for {:?}", self.entry_type, self.name);
        Ok(block)
    }
}
