#![no_std]
#![feature(type_alias_impl_trait)]

//! ESP32 firmware of the MyrtIO pixel controller
//!
//! Animation, state and protocol logic live in `myrtio-pixel-core`; this
//! crate wires them to the LED strip, the flash and the network.

pub mod controllers;
pub mod infrastructure;
