// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! In-flight render tracking

use crate::request::RenderResult;
use std::sync::{Condvar, Mutex, PoisonError};

/// A render currently being computed by one caller. Others wait on it.
#[derive(Debug, Default)]
pub struct Flight {
    // Outer None: still running. Inner None: owner gave up without a result.
    state: Mutex<Option<Option<RenderResult>>>,
    done: Condvar,
}

impl Flight {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn finish(&self, result: Option<RenderResult>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.is_none() {
            *state = Some(result);
        }
        self.done.notify_all();
    }

    /// Block until the owner finishes. `None` means it was abandoned and the
    /// caller should claim again.
    pub fn wait(&self) -> Option<RenderResult> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        while state.is_none() {
            state = self.done.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        (*state).clone().flatten()
    }

    pub fn is_finished(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
