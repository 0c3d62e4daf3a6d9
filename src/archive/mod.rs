mod header;
mod options;
mod reader;
mod timestamp;
mod writer;

pub use header::checksum;

pub use options::*;

pub use reader::*;

pub use timestamp::*;

pub use writer::*;
