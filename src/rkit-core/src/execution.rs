// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use serde::Serialize;
use thiserror::Error;

/// Why a command invocation did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
pub enum ExecutionError {
    #[error("function {0} is not bound to a provided command")]
    NotBound(String),

    #[error("command {command} is not provided by interface {interface}")]
    UnknownCommand { interface: String, command: String },

    #[error("component {0} is no longer running")]
    Disconnected(String),

    #[error("{0}")]
    Rejected(String),
}

impl ExecutionError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

pub type ExecutionResult = Result<(), ExecutionError>;
