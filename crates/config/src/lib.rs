// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod app_config;
mod errors;
mod field_config;
pub mod load_config;

pub use app_config::*;
pub use errors::ConfigError;
pub use field_config::*;
