//! Sandboxed directory roots.
//!
//! A [`Sandbox`] only ever touches direct children of its root, addressed
//! by a single plain file name. Names with separators, `.`/`..`, or an
//! absolute prefix are rejected before the filesystem is consulted, so no
//! path built from caller input can escape the root.
//!
//! Every name is write-once: originals are created with `create_new`, and
//! renditions are staged in a temporary file and persisted without
//! clobbering, so a reader never sees a half-written rendition.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

#[derive(Debug)]
pub struct Sandbox {
    root: PathBuf,
}

/// Reject anything that is not exactly one normal path component.
pub fn validate_name(name: &str) -> io::Result<()> {
    let mut components = Path::new(name).components();
    let single_normal = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none();

    if name.is_empty() || !single_normal || name.contains(['/', '\\', '\0']) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid file name {name:?}"),
        ));
    }
    Ok(())
}

impl Sandbox {
    /// Open `parent/name` as a sandbox, creating the directory if needed.
    ///
    /// An already existing directory is not an error.
    pub fn open(parent: &Path, name: &str) -> io::Result<Self> {
        validate_name(name)?;
        let root = parent.join(name);
        match fs::create_dir(&root) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }

        let root = root.canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Absolute path of `name` inside the sandbox.
    pub fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_ok_and(|p| p.exists())
    }

    /// Create `name` for writing; fails if it already exists.
    pub fn create_new(&self, name: &str) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.resolve(name)?)
    }

    /// Write `name` atomically through a temporary file in the sandbox.
    ///
    /// The file only appears under its final name once `write` has
    /// succeeded and the data is flushed. Fails if `name` already exists.
    pub fn write_new<F, E>(&self, name: &str, write: F) -> Result<PathBuf, E>
    where
        F: FnOnce(&mut dyn Write) -> Result<(), E>,
        E: From<io::Error>,
    {
        let target = self.resolve(name)?;
        let mut staged = tempfile::Builder::new()
            .prefix(".staging-")
            .tempfile_in(&self.root)?;

        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            write(&mut writer)?;
            writer.flush()?;
        }

        staged.persist_noclobber(&target).map_err(|e| e.error)?;
        Ok(target)
    }
}
