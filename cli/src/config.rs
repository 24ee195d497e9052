// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, ffi::OsString, path::PathBuf};

use calsync_core::Config;

const CALSYNC_CONFIG_ENV: &str = "CALSYNC_CONFIG";

#[tracing::instrument]
pub fn parse_config(path: Option<PathBuf>) -> Result<Config, Box<dyn Error>> {
    let path = resolve_path(path, std::env::var_os(CALSYNC_CONFIG_ENV))?;
    Ok(Config::load(&path)?)
}

/// `--config` wins over the environment, which wins over the default location.
fn resolve_path(arg: Option<PathBuf>, env: Option<OsString>) -> Result<PathBuf, Box<dyn Error>> {
    if let Some(path) = arg {
        return Ok(path);
    }
    match env {
        Some(env) if !env.is_empty() => Ok(PathBuf::from(env)),
        _ => Ok(Config::default_path()?),
    }
}
