use std::path::PathBuf;

/// Failures of the command line tool, each with its own exit code.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("'{0}' does not exist")]
    FileNotFound(PathBuf),

    #[error("'{0}' is not a file!")]
    NotAFile(PathBuf),

    #[error("'{0}' is not a valid timeout number!")]
    InvalidTimeout(String),

    #[error("'{0}' is not a valid version number!")]
    InvalidVersion(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        use CliError::*;
        match self {
            FileNotFound(_) | Other(_) => 1,
            NotAFile(_) => 2,
            InvalidTimeout(_) => 3,
            InvalidVersion(_) => 4,
        }
    }
}

impl From<fsutil::Error> for CliError {
    fn from(e: fsutil::Error) -> Self {
        match e {
            fsutil::Error::NotAFile(path) => CliError::NotAFile(path),
            fsutil::Error::SingleIO(_, path, ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path)
            }
            e => CliError::Other(e.into()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(CliError::FileNotFound("a".into()).exit_code(), 1);
        assert_eq!(CliError::NotAFile("a".into()).exit_code(), 2);
        assert_eq!(CliError::InvalidTimeout("0".into()).exit_code(), 3);
        assert_eq!(CliError::InvalidVersion("x".into()).exit_code(), 4);
        assert_eq!(CliError::from(anyhow::anyhow!("bad json")).exit_code(), 1);
    }

    #[test]
    fn fsutil_errors_keep_their_meaning() {
        let missing = fsutil::ensure_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(CliError::from(missing), CliError::FileNotFound(_)));

        let dir = fsutil::ensure_file(std::env::temp_dir()).unwrap_err();
        assert!(matches!(CliError::from(dir), CliError::NotAFile(_)));
    }
}
