// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::errors::ConfigError;
use crate::field_config::FieldConfig;
use crate::load_config::{find_in_parent, resolve_config_path, ConfigSource};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use prio_field::FieldPreset;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{env, io};
use tracing::info;

pub const DEFAULT_CONFIG_NAME: &str = "prio.config.yaml";
/// Each server buffers this many in-flight submissions per leader by default.
pub const DEFAULT_MAX_PENDING_REQS: usize = 64;
pub const DEFAULT_NUM_SERVERS: usize = 5;
pub const DEFAULT_EVAL_POINT_ROTATION: usize = 1024;
pub const ENV_PREFIX: &str = "PRIO_";

/// Settings shared by every party of a deployment.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// The prime field every share lives in
    pub field: FieldPreset,
    /// Number of servers that hold shares
    pub num_servers: usize,
    /// Checkers each server keeps per leader, bounding in-flight requests
    pub max_pending_reqs: usize,
    /// Requests between rotations of the shared evaluation point
    pub eval_point_rotation: usize,
    /// The collection schema
    pub fields: Vec<FieldConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            field: FieldPreset::default(),
            num_servers: DEFAULT_NUM_SERVERS,
            max_pending_reqs: DEFAULT_MAX_PENDING_REQS,
            eval_point_rotation: DEFAULT_EVAL_POINT_ROTATION,
            fields: default_fields(),
        }
    }
}

fn default_fields() -> Vec<FieldConfig> {
    vec![
        FieldConfig::Int {
            name: "val0".to_string(),
            int_bits: 4,
        },
        FieldConfig::BoolOr {
            name: "bool0".to_string(),
        },
        FieldConfig::BoolAnd {
            name: "bool1".to_string(),
        },
        FieldConfig::IntUnsafe {
            name: "unsafe0".to_string(),
            int_bits: 5,
        },
        FieldConfig::IntPow {
            name: "pow0".to_string(),
            int_bits: 3,
            int_pow: 4,
        },
        FieldConfig::CountMin {
            name: "sketch".to_string(),
            count_min_hashes: 4,
            count_min_buckets: 8,
        },
        FieldConfig::LinReg {
            name: "linReg0".to_string(),
            lin_reg_bits: vec![2, 3, 4],
        },
    ]
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |setting: &'static str, value: usize| {
            if value == 0 {
                Err(ConfigError::InvalidSetting {
                    setting,
                    message: "must be at least 1".to_string(),
                })
            } else {
                Ok(())
            }
        };
        positive("num_servers", self.num_servers)?;
        positive("max_pending_reqs", self.max_pending_reqs)?;
        positive("eval_point_rotation", self.eval_point_rotation)?;

        let mut names = HashSet::new();
        for field in &self.fields {
            field.validate()?;
            if !names.insert(field.name()) {
                return Err(ConfigError::DuplicateField(field.name().to_string()));
            }
        }
        Ok(())
    }
}

/// Load the config at `config_file`, or the nearest `prio.config.yaml` above
/// the working directory, layered over the defaults and under `PRIO_*`
/// environment variables.
pub fn load_config(config_file: Option<String>) -> Result<AppConfig> {
    let source = resolve_config_path(
        find_in_parent,
        env::current_dir()?,
        DEFAULT_CONFIG_NAME,
        config_file.map(Into::into),
    );

    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
    match &source {
        ConfigSource::Explicit(path) => {
            if !path.exists() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} does not exist", path.display()),
                ))
                .context("Configuration file not found");
            }
            info!(path = %path.display(), "Loading configuration");
            figment = figment.merge(Yaml::file(path));
        }
        ConfigSource::Found(path) => {
            info!(path = %path.display(), "Loading configuration");
            figment = figment.merge(Yaml::file(path));
        }
        ConfigSource::Defaults => info!("No configuration file found, using defaults"),
    }

    let config: AppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).only(&[
            "field",
            "num_servers",
            "max_pending_reqs",
            "eval_point_rotation",
        ]))
        .extract()
        .context("Could not parse configuration")?;

    config.validate().context("Invalid configuration")?;
    Ok(config)
}
