use std::{
    path::{Path, PathBuf},
    process::exit,
};

use tokio_util::sync::CancellationToken;

pub fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|e| {
        eprintln!("Failed to get current dir: {}", e);
        exit(1);
    })
}

pub fn replace_homedir_to_tilde(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    let Some(home_dir) = ::dirs::home_dir() else {
        return path
    };
    path.strip_prefix(home_dir)
        .map(|path| Path::new("~").join(path))
        .unwrap_or(path)
}

/// `RUST_LOG` wins when set; otherwise `-v` raises the level step by step.
pub fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Returns a token that is cancelled on the first Ctrl-C. The case in flight
/// and every case after it are then reported as interrupted.
pub fn interrupt_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::warn!("Interrupted; remaining cases are skipped");
                child.cancel();
            }
            Err(e) => log::error!("Failed to listen for Ctrl-C: {}", e),
        }
    });
    token
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn homedir_is_shortened() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(
            replace_homedir_to_tilde(home.join("data.json")),
            Path::new("~").join("data.json")
        );
        assert_eq!(
            replace_homedir_to_tilde("/tmp/x.json"),
            PathBuf::from("/tmp/x.json")
        );
    }
}
