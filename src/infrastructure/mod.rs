//! Infrastructure layer
//!
//! Hardware drivers, the network transport and the tasks that run them.

pub mod config;
pub mod drivers;
pub mod services;
pub mod tasks;
