//! Builder-style knobs for the writer and the reader.

use super::Timestamp;

/// Metadata attached to one entry handed to the writer.
///
/// Unset fields fall back to tar conventions: mode `0644` for files and
/// `0755` for folders, root ownership, and the time the entry was added.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileOptions {
    pub(crate) mode: Option<u32>,
    pub(crate) mtime: Option<Timestamp>,
    pub(crate) uid: u32,
    pub(crate) gid: u32,
    pub(crate) user: String,
    pub(crate) group: String,
}

impl FileOptions {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> FileOptionsBuilder {
        FileOptionsBuilder {
            inner: FileOptions::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FileOptionsBuilder {
    inner: FileOptions,
}

impl FileOptionsBuilder {
    /// Permission bits, e.g. `0o600`. File type bits are derived from the entry kind.
    pub fn mode(mut self, mode: u32) -> Self {
        self.inner.mode = Some(mode);
        self
    }

    pub fn mtime(mut self, mtime: impl Into<Timestamp>) -> Self {
        self.inner.mtime = Some(mtime.into());
        self
    }

    pub fn uid(mut self, uid: u32) -> Self {
        self.inner.uid = uid;
        self
    }

    pub fn gid(mut self, gid: u32) -> Self {
        self.inner.gid = gid;
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.inner.user = user.into();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.inner.group = group.into();
        self
    }
}

impl From<FileOptionsBuilder> for FileOptions {
    fn from(builder: FileOptionsBuilder) -> Self {
        builder.inner
    }
}

/// How the reader decides that an archive has ended.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Termination {
    /// Stop at the first all-zero block, or at the end of the buffer after
    /// a complete entry. Tolerates a missing final padding.
    #[default]
    Lenient,
    /// Require two all-zero blocks and fully padded content.
    Strict,
}

/// Reader configuration.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub(crate) termination: Termination,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    pub fn strict(self) -> Self {
        self.termination(Termination::Strict)
    }

    pub fn is_strict(&self) -> bool {
        self.termination == Termination::Strict
    }
}
