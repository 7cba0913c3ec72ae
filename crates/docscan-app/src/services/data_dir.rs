// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware config directory resolution.

use std::path::PathBuf;

/// Return the per-user settings file location (not created).
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Return the application config directory.
pub fn config_dir() -> PathBuf {
    resolve_config_dir(
        std::env::var("XDG_CONFIG_HOME").ok().as_deref(),
        std::env::var("HOME").ok().as_deref(),
    )
}

fn resolve_config_dir(xdg: Option<&str>, home: Option<&str>) -> PathBuf {
    // Try XDG config dir, then fallback to home
    let base = match (xdg, home) {
        (Some(xdg), _) if !xdg.is_empty() => PathBuf::from(xdg),
        (_, Some(home)) if !home.is_empty() => PathBuf::from(home).join(".config"),
        // Last resort
        _ => PathBuf::from("."),
    };
    base.join("docscan")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_xdg() {
        assert_eq!(
            resolve_config_dir(Some("/xdg"), Some("/home/u")),
            PathBuf::from("/xdg/docscan")
        );
    }

    #[test]
    fn falls_back_to_home() {
        assert_eq!(
            resolve_config_dir(Some(""), Some("/home/u")),
            PathBuf::from("/home/u/.config/docscan")
        );
        assert_eq!(resolve_config_dir(None, None), PathBuf::from("./docscan"));
    }
}
