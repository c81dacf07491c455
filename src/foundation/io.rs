use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{BitreelError, BitreelResult};

/// Read until `buf` is full or the reader hits EOF; returns the number of bytes read.
pub fn read_full(r: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> BitreelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Output file that is deleted again unless [`OutputFile::commit`] is reached.
///
/// A run that fails part way leaves nothing behind instead of a truncated file.
pub struct OutputFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl OutputFile {
    pub fn create(path: &Path) -> BitreelResult<Self> {
        ensure_parent_dir(path)?;
        let file = File::create(path).map_err(|e| {
            BitreelError::destination(format!("failed to create '{}': {e}", path.display()))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and keep the file.
    pub fn commit(mut self) -> BitreelResult<PathBuf> {
        let Some(writer) = self.writer.take() else {
            return Ok(self.path.clone());
        };
        let finished = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .and_then(|file| file.sync_all());
        if let Err(e) = finished {
            let _ = std::fs::remove_file(&self.path);
            return Err(BitreelError::destination(format!(
                "failed to finalize '{}': {e}",
                self.path.display()
            )));
        }
        Ok(self.path.clone())
    }

    fn writer(&mut self) -> std::io::Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| std::io::Error::other("output file already committed"))
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer()?.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer()?.flush()
    }
}

impl Drop for OutputFile {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/io.rs"]
mod tests;
