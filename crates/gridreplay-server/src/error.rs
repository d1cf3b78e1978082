// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridreplay.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use thiserror::Error;

/// The only error type allowed to reach `main` (§7 ambient note). Every other
/// taxonomy bucket — transient client input, client transport, internal
/// invariant — is handled in place and never crosses a task boundary.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("no sensors registered; refusing to start")]
    NoSensors,
    #[error("failed to parse configuration")]
    ConfigParse(#[from] toml::de::Error),
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),
}
