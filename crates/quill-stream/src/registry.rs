// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Registration of custom record kinds.
//!
//! New commands are added by registering a handler for a kind at or above
//! [`CUSTOM_KIND_BASE`], without touching the built-in decoder.

use crate::error::RegistryError;
use crate::format::CUSTOM_KIND_BASE;
use quill_core::RenderDriver;
use std::collections::HashMap;
use std::fmt;

/// Replays the payload of one custom record kind.
pub trait CustomCommandHandler: Send {
    /// Executes one record. `payload` is exactly the bytes the producer
    /// allocated through [`custom_command`](crate::RecordCommands::custom_command).
    fn execute(&self, payload: &[u8], driver: &mut dyn RenderDriver);
}

impl<F> CustomCommandHandler for F
where
    F: Fn(&[u8], &mut dyn RenderDriver) + Send,
{
    fn execute(&self, payload: &[u8], driver: &mut dyn RenderDriver) {
        self(payload, driver)
    }
}

/// Maps custom record kinds to their handlers on the replaying side.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<u16, Box<dyn CustomCommandHandler>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for `kind`.
    ///
    /// ## Errors
    /// * [`RegistryError::ReservedKind`] if `kind` is below [`CUSTOM_KIND_BASE`].
    /// * [`RegistryError::AlreadyRegistered`] if `kind` already has a handler.
    pub fn register<H>(&mut self, kind: u16, handler: H) -> Result<(), RegistryError>
    where
        H: CustomCommandHandler + 'static,
    {
        if kind < CUSTOM_KIND_BASE {
            return Err(RegistryError::ReservedKind { kind });
        }
        if self.handlers.contains_key(&kind) {
            return Err(RegistryError::AlreadyRegistered { kind });
        }
        self.handlers.insert(kind, Box::new(handler));
        log::debug!("Registered custom command kind {kind:#06x}");
        Ok(())
    }

    /// Removes the handler for `kind`, returning whether one was registered.
    pub fn unregister(&mut self, kind: u16) -> bool {
        self.handlers.remove(&kind).is_some()
    }

    /// Returns the handler for `kind`, if any.
    pub fn get(&self, kind: u16) -> Option<&dyn CustomCommandHandler> {
        self.handlers.get(&kind).map(|h| h.as_ref())
    }

    /// Returns the number of registered kinds.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no kind is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort_unstable();
        f.debug_struct("CommandRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}
