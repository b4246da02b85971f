/* This file is part of Gallus (https://gallus.fi)
 *
 * Copyright (C) 2020-2025 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::{env, path::PathBuf};

use crate::{Error, Result};

/// Returns the path to the user's home directory, from `$HOME`.
fn home_dir() -> Result<PathBuf> {
    match env::var_os("HOME") {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(home)),
        _ => Err(Error::ParseFailed("Home directory not found")),
    }
}

/// Expand a leading tilde in the given path into the user's home directory.
pub fn expand_path(path: &str) -> Result<PathBuf> {
    if path == "~" {
        return home_dir()
    }

    if let Some(stripped) = path.strip_prefix("~/") {
        let mut ret = home_dir()?;
        ret.push(stripped);
        return Ok(ret)
    }

    Ok(PathBuf::from(path))
}

/// Resolve the configuration file path: an explicitly given path is
/// expanded, otherwise the file is looked up in the default config dir.
pub fn get_config_path(config: Option<String>, config_file: &str) -> Result<PathBuf> {
    if let Some(ref cfg) = config {
        return expand_path(cfg)
    }

    Ok(expand_path("~/.config/gallus")?.join(config_file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path() {
        let home = env::var("HOME").unwrap();

        assert_eq!(expand_path("~").unwrap(), PathBuf::from(&home));
        assert_eq!(expand_path("~/foo/bar").unwrap(), PathBuf::from(format!("{home}/foo/bar")));
        assert_eq!(expand_path("/foo/bar").unwrap(), PathBuf::from("/foo/bar"));
        assert_eq!(expand_path("foo").unwrap(), PathBuf::from("foo"));
    }
}
