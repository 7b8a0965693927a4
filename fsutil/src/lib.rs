use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

pub mod error {
    use std::{io, path::PathBuf};

    pub type Result<T> = std::result::Result<T, self::Error>;

    type Msg = &'static str;

    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("{0} ({1}): {2}")]
        SingleIO(Msg, PathBuf, #[source] io::Error),

        #[error("'{0}' is not a file")]
        NotAFile(PathBuf),

        #[error("Cannot serialize to JSON (dest='{0}'): {1}")]
        SerializeToJson(PathBuf, #[source] serde_json::Error),

        #[error("Cannot deserialize from JSON (src='{0}'): {1}")]
        DeserializeFromJson(PathBuf, #[source] serde_json::Error),
    }

    impl Error {
        pub fn is_not_found(&self) -> bool {
            match self {
                Self::SingleIO(_, _, e) => e.kind() == io::ErrorKind::NotFound,
                _ => false,
            }
        }
    }
}
pub use error::{Error, Result};

/// Fails with [`Error::NotAFile`] when `path` exists but is a directory (or
/// anything else that is not a regular file).
#[must_use]
pub fn ensure_file(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let meta = fs::metadata(path)
        .map_err(|e| Error::SingleIO("Cannot access file", path.to_owned(), e))?;
    if meta.is_file() {
        Ok(())
    } else {
        Err(Error::NotAFile(path.to_owned()))
    }
}

#[must_use]
pub fn read_to_string(filepath: impl AsRef<Path>) -> Result<String> {
    fs::read_to_string(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn write(filepath: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    fs::write(&filepath, contents)
        .map_err(|e| Error::SingleIO("Cannot write file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn read_json_with_deserialize<P, T>(filepath: P) -> Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let filepath = filepath.as_ref();
    let f = File::open(filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.to_owned(), e))?;
    serde_json::from_reader(BufReader::new(f))
        .map_err(|e| Error::DeserializeFromJson(filepath.to_owned(), e))
}

/// Serializes `data` and replaces the contents of `filepath`.
#[must_use]
pub fn write_json<P, T>(filepath: P, data: &T, pretty: bool) -> Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let filepath = filepath.as_ref();
    let f = File::create(filepath)
        .map_err(|e| Error::SingleIO("Cannot write file", filepath.to_owned(), e))?;
    let mut w = BufWriter::new(f);
    let res = if pretty {
        serde_json::to_writer_pretty(&mut w, data)
    } else {
        serde_json::to_writer(&mut w, data)
    };
    res.map_err(|e| Error::SerializeToJson(filepath.to_owned(), e))?;
    w.write_all(b"\n")
        .and_then(|_| w.flush())
        .map_err(|e: io::Error| Error::SingleIO("Cannot write file", filepath.to_owned(), e))?;
    log::debug!("Wrote {}", filepath.to_string_lossy());
    Ok(())
}

/// Looks for `filename` in `start_dir` and then in each of its ancestors.
pub fn find_file_in_ancestors(start_dir: impl AsRef<Path>, filename: &str) -> Option<PathBuf> {
    start_dir
        .as_ref()
        .ancestors()
        .map(|dir| dir.join(filename))
        .find(|path| path.is_file())
}
