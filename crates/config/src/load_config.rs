// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::{Path, PathBuf};

use path_clean::clean;

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

pub fn find_in_parent(path: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = PathBuf::from(path);

    loop {
        let file_path = current.join(filename);
        if file_path.exists() {
            return Some(file_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Where to read configuration from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A path given on the command line. It must exist.
    Explicit(PathBuf),
    /// A file found by walking up from the working directory.
    Found(PathBuf),
    /// Nothing to read; defaults and environment only.
    Defaults,
}

pub fn resolve_config_path<P: Into<PathBuf>>(
    find_in_parent: FindInParent,
    cwd: P,
    default_filename: &str,
    cli_file: Option<P>,
) -> ConfigSource {
    let cwd = cwd.into();

    if let Some(cli_file) = cli_file.map(Into::into) {
        // config is passed in and is absolute
        if cli_file.is_absolute() {
            return ConfigSource::Explicit(cli_file);
        }

        // config is passed in and is relative
        return ConfigSource::Explicit(clean(cwd.join(cli_file)));
    }

    // search from cwd
    match find_in_parent(&cwd, default_filename) {
        Some(found) => ConfigSource::Found(found),
        None => ConfigSource::Defaults,
    }
}
