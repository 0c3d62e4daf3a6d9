//! # ustar
//!
//! A library to build and parse tar archives entirely in memory.
//!
//! Archives use the POSIX `ustar` header layout, so they can be read by
//! any standard tar implementation, and archives produced by GNU tar
//! with `--format=ustar` can be read back.
//!
//! # Example
//!
//! ```rust
//! use ustar::{FileOptions, ReadOptions, TarReader, TarWriter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tar = TarWriter::new();
//! tar.add_folder("template", FileOptions::default())?
//!     .add_file(
//!         "template/main.tf",
//!         "resource \"null_resource\" \"dev\" {}\n",
//!         FileOptions::new().mode(0o600).user("coder").group("coder"),
//!     )?
//!     // raw bytes are stored untouched
//!     .add_file("template/logo.bin", vec![0x89, b'P', b'N', b'G', 0x00], FileOptions::default())?;
//! let bytes = tar.write();
//!
//! // reading
//! let reader = TarReader::read_file_with(&bytes, &ReadOptions::new().strict())?;
//! for file in reader.file_info() {
//!     println!("{} {} {}", file.entry_type(), file.size(), file.name());
//! }
//! assert_eq!(
//!     reader.get_text_file("template/main.tf")?,
//!     "resource \"null_resource\" \"dev\" {}\n"
//! );
//! assert_eq!(reader.get_file("template/logo.bin")?, &[0x89, b'P', b'N', b'G', 0x00]);
//! # Ok(())
//! # }
//! ```

#![allow(unknown_lints, clippy::uninlined_format_args)]

mod errors;
pub use crate::errors::*;

pub(crate) mod constants;
pub use crate::constants::*;

mod archive;
pub use crate::archive::*;
