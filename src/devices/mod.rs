// MIT License - Copyright (c) 2026 Peter Wright
// Panel entity models

pub mod output;
pub mod partition;
pub mod zone;

pub use output::Output;
pub use partition::{ArmStatus, Partition};
pub use zone::{Callback, Zone, ZoneStatusFlags};
