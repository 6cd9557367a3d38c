// MIT License - Copyright (c) 2026 Peter Wright
// Partition arming state

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::devices::zone::Callback;
use crate::error::{AdemcoError, Result};
use crate::event::PanelEvent;
use crate::panel::PanelShared;

/// Arming state reported per partition in an `AS` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmStatus {
    /// `A`
    ArmedAway,
    /// `H`
    ArmedHome,
    /// `D`
    Disarmed,
}

impl ArmStatus {
    pub fn from_code(c: char) -> Result<Self> {
        match c {
            'A' => Ok(Self::ArmedAway),
            'H' => Ok(Self::ArmedHome),
            'D' => Ok(Self::Disarmed),
            other => Err(AdemcoError::InvalidPartitionStatus(other)),
        }
    }

    pub fn code(&self) -> char {
        match self {
            Self::ArmedAway => 'A',
            Self::ArmedHome => 'H',
            Self::Disarmed => 'D',
        }
    }

    pub fn is_armed(&self) -> bool {
        !matches!(self, Self::Disarmed)
    }
}

struct PartitionInner {
    id: u32,
    status: RwLock<ArmStatus>,
    callbacks: RwLock<Vec<Callback>>,
    panel: Weak<PanelShared>,
}

/// A single alarm partition, created the first time an `AS` report names it.
#[derive(Clone)]
pub struct Partition {
    inner: Arc<PartitionInner>,
}

impl Partition {
    pub(crate) fn new(id: u32, status: ArmStatus, panel: Weak<PanelShared>) -> Self {
        Self {
            inner: Arc::new(PartitionInner {
                id,
                status: RwLock::new(status),
                callbacks: RwLock::new(Vec::new()),
                panel,
            }),
        }
    }

    pub fn id(&self) -> u32 {
        self.inner.id
    }

    pub fn arm_status(&self) -> ArmStatus {
        *self.inner.status.read()
    }

    /// True when armed away or armed home.
    pub fn armed(&self) -> bool {
        self.arm_status().is_armed()
    }

    pub fn register_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.callbacks.write().push(Arc::new(callback));
    }

    /// Apply a status letter. Returns `Ok(true)` if the state changed; an
    /// unknown letter is an error and leaves the state unchanged.
    pub fn process_status(&self, code: char) -> Result<bool> {
        let new_status = ArmStatus::from_code(code)?;
        let old_status = {
            let mut status = self.inner.status.write();
            if *status == new_status {
                return Ok(false);
            }
            std::mem::replace(&mut *status, new_status)
        };

        let callbacks: Vec<Callback> = self.inner.callbacks.read().clone();
        for callback in &callbacks {
            callback();
        }
        if let Some(panel) = self.inner.panel.upgrade() {
            panel.emit(PanelEvent::PartitionStatusChanged {
                partition_id: self.inner.id,
                old_status,
                new_status,
            });
        }
        Ok(true)
    }
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partition")
            .field("id", &self.inner.id)
            .field("arm_status", &self.arm_status())
            .finish()
    }
}
