// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Default location of the configuration file.

use std::path::PathBuf;

const CONFIG_FILE: &str = "config.json";

/// `$XDG_DATA_HOME/alphajet/config.json`, falling back to
/// `~/.local/share/alphajet/config.json`.
pub fn default_config_path() -> PathBuf {
    data_dir().join(CONFIG_FILE)
}

/// Application data directory. Not created here; only `config init` writes
/// into it.
pub fn data_dir() -> PathBuf {
    base_dir().join("alphajet")
}

fn base_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg);
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    PathBuf::from(".")
}
