//! Interactive terminal chat with Kathor.
//!
//! Runs turns on an in-process engine and renders the soul's events as they
//! stream: a spinner while a message is still empty, thoughts in dim
//! italics, answers as plain streamed text. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
