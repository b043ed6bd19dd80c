//! Working memory: the ordered, immutable log cognitive steps read and extend.

pub mod working;

pub use working::WorkingMemory;
