#![deny(warnings)]

pub mod console;
