// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::{Path, PathBuf};

use navbridge_core::error::Result;

/// Application data directory, created if needed.
pub fn data_dir() -> Result<PathBuf> {
    let dir = base_dir(
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
    .join("navbridge");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Default location of the config file inside `dir`.
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join("config.json")
}

fn base_dir(xdg_data_home: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    if let Some(xdg) = xdg_data_home.filter(|p| !p.as_os_str().is_empty()) {
        return xdg;
    }
    if let Some(home) = home {
        return home.join(".local").join("share");
    }
    PathBuf::from("/tmp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_wins_then_home_then_tmp() {
        assert_eq!(
            base_dir(Some("/xdg".into()), Some("/home/u".into())),
            PathBuf::from("/xdg")
        );
        assert_eq!(
            base_dir(Some("".into()), Some("/home/u".into())),
            PathBuf::from("/home/u/.local/share")
        );
        assert_eq!(base_dir(None, None), PathBuf::from("/tmp"));
    }

    #[test]
    fn config_lives_in_data_dir() {
        assert_eq!(
            config_path(Path::new("/data/navbridge")),
            PathBuf::from("/data/navbridge/config.json")
        );
    }
}
