// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
mod schema;
mod loader;
pub mod hints;

pub use schema::*;
pub use loader::{load, load_layered, LoadedConfig};
pub use hints::{load_hints, OptionHints};
