//! Player binary detection.

use crate::failover::PlayerError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// A player binary located on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProgram {
    name: String,
    path: PathBuf,
}

impl PlayerProgram {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// First of `candidates` found on this host, in the given order.
    ///
    /// Candidates containing a path separator are checked as paths; bare
    /// names are looked up on `PATH`.
    pub fn detect(candidates: &[String]) -> Result<Self, PlayerError> {
        let search_path = std::env::var_os("PATH").unwrap_or_default();
        Self::detect_in(candidates, &search_path)
    }

    /// Like [`detect`](Self::detect) with an explicit search path.
    pub fn detect_in(candidates: &[String], search_path: &OsStr) -> Result<Self, PlayerError> {
        for candidate in candidates {
            if let Some(path) = locate(candidate, search_path) {
                tracing::info!(player = %candidate, path = %path.display(), "Found player");
                return Ok(Self::new(program_name(candidate), path));
            }
            tracing::debug!(player = %candidate, "Player not found");
        }
        Err(PlayerError::NoPlayerFound(candidates.join(", ")))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Arguments for playing `url`.
    pub fn args(&self, extra_args: &[String], url: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(extra_args.len() + 2);
        if self.name == "ffplay" {
            // Otherwise ffplay keeps its window open after the stream ends
            args.push("-autoexit".to_string());
        }
        args.extend(extra_args.iter().cloned());
        args.push(url.to_string());
        args
    }
}

fn program_name(candidate: &str) -> String {
    Path::new(candidate)
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or(candidate)
        .to_string()
}

fn locate(candidate: &str, search_path: &OsStr) -> Option<PathBuf> {
    let as_path = Path::new(candidate);
    if as_path.components().count() > 1 {
        return is_executable(as_path).then(|| as_path.to_path_buf());
    }
    std::env::split_paths(search_path)
        .map(|dir| dir.join(candidate))
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffplay_gets_autoexit() {
        let program = PlayerProgram::new("ffplay", "/usr/bin/ffplay");
        assert_eq!(
            program.args(&[], "http://x/live.m3u8"),
            vec!["-autoexit", "http://x/live.m3u8"]
        );
    }

    #[test]
    fn test_extra_args_precede_url() {
        let program = PlayerProgram::new("mpv", "/usr/bin/mpv");
        let extra = vec!["--fs".to_string()];
        assert_eq!(program.args(&extra, "http://x/a.mp4"), vec!["--fs", "http://x/a.mp4"]);
    }

    #[test]
    fn test_detect_reports_tried_players() {
        let dir = tempfile::tempdir().unwrap();
        let candidates = vec!["mpv".to_string(), "vlc".to_string()];
        let err = PlayerProgram::detect_in(&candidates, dir.path().as_os_str()).unwrap_err();
        assert_eq!(err, PlayerError::NoPlayerFound("mpv, vlc".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_detect_respects_preference_order() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        for name in ["vlc", "ffplay"] {
            let path = dir.path().join(name);
            std::fs::write(&path, "#!/bin/sh\n").unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        // Present but not executable
        std::fs::write(dir.path().join("mpv"), "").unwrap();

        let candidates = vec!["mpv".to_string(), "vlc".to_string(), "ffplay".to_string()];
        let program = PlayerProgram::detect_in(&candidates, dir.path().as_os_str()).unwrap();
        assert_eq!(program.name(), "vlc");
        assert_eq!(program.path(), dir.path().join("vlc"));
    }
}
