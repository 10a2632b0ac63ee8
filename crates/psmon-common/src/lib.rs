//! Value types shared between the psmon collector, storage and server crates.

pub mod types;
