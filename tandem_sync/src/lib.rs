#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

mod handoff;
pub use self::handoff::{Handoff, Intake, handoff};

mod latch;
pub use self::latch::{Gate, Latch};
