// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridreplay.

use thiserror::Error;

/// Reserved for truly exceptional store failures. Per §4.1/§7 an unknown
/// sensor id or a malformed reading is tolerated (empty result / discarded
/// with a warning), never an `Err` — this type exists for lock poisoning and
/// similar conditions that should never occur in practice.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reading store lock poisoned")]
    LockPoisoned,
}
