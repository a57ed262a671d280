use crate::CompiledUnit;
use anyhow::anyhow;
use formatx::formatx;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

/// A destination for compiled documents, addressed by a per-document key.
pub trait Output: Debug {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write>;
    /// Whether this output can be considered a no-op and therefore that any code that only writes to the output can be skipped.
    fn is_noop(&self) -> bool {
        false
    }
}

/// Writes each document to its own file in a directory. The file name is the template
/// with its `{}` placeholder replaced by the location key.
#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutput {
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }

    fn file_name(&self, location_key: &str) -> anyhow::Result<String> {
        formatx!(&self.file_template, location_key)
            .map_err(|err| anyhow!("invalid file template {:?}: {err:?}", self.file_template))
    }
}

impl Output for FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        let path = self.directory_path.join(self.file_name(location_key)?);
        debug!(path = %path.display(), "writing document");
        Ok(BufWriter::new(File::create(path)?))
    }
}

/// Discards every document, for runs that only check that the sheets compile.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_location_key(&self, _location_key: &str) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

/// Writes a compiled unit's markup, keyed by the name of the sheet it came from.
pub fn write_compiled_unit(output: &impl Output, unit: &CompiledUnit) -> anyhow::Result<()> {
    if output.is_noop() {
        return Ok(());
    }

    let mut writer = output.writer_for_location_key(&unit.sheet_name)?;
    writer.write_all(unit.markup.as_bytes())?;
    writer.flush()?;
    Ok(())
}
