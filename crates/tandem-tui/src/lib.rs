// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
mod arbiter;
mod collab;
mod commands;
mod editor;
mod keys;
mod settings;
mod state;

pub use arbiter::{
    Arbiter, ArbiterOptions, Input, InputHandle, RemoteCommand, EXIT_WINDOW_MAX, EXIT_WINDOW_MIN,
};
pub use collab::{Collaborators, ExitHandler, PromptSink, SettingsCommitter, SwitchHandler};
pub use commands::{parse_command, SlashCommand};
pub use editor::{PromptEditor, PromptHistory};
pub use keys::{map_key, Action};
pub use settings::options::{build_options, PickerOption, CUSTOM_LABEL, CUSTOM_VALUE};
pub use settings::{PickerField, RunSettings, SettingsDraft, SettingsRow};
pub use state::{ArbiterView, ControlMode, PickerView, SettingsView, SubState};
