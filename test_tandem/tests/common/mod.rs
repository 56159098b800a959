#![allow(dead_code)]

pub mod channel;
pub mod logging;
pub mod names;
