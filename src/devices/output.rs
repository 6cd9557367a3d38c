// MIT License - Copyright (c) 2026 Peter Wright
// Relay outputs

use std::fmt;
use std::sync::Weak;

use crate::error::{AdemcoError, Result};
use crate::panel::PanelShared;

/// Handle to a relay output.
///
/// State lives in the panel; the handle reads it on demand. Driving the
/// output queues the relay command and updates local state straight away,
/// without waiting for a `CS` report to confirm it.
#[derive(Clone)]
pub struct Output {
    id: u32,
    panel: Weak<PanelShared>,
}

impl Output {
    pub(crate) fn new(id: u32, panel: Weak<PanelShared>) -> Self {
        Self { id, panel }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_on(&self) -> bool {
        self.panel
            .upgrade()
            .and_then(|panel| panel.output_state(self.id))
            .unwrap_or(false)
    }

    pub fn is_off(&self) -> bool {
        !self.is_on()
    }

    pub fn turn_on(&self) -> Result<()> {
        self.drive(true)
    }

    pub fn turn_off(&self) -> Result<()> {
        self.drive(false)
    }

    fn drive(&self, on: bool) -> Result<()> {
        let panel = self.panel.upgrade().ok_or(AdemcoError::ShutDown)?;
        panel.set_output(self.id, on)
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("id", &self.id)
            .field("on", &self.is_on())
            .finish()
    }
}
