//! Event bus carrying soul events to presentation surfaces.

pub mod bus;

pub use bus::EventBus;
