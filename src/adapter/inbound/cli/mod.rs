//! CLI module graph.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod entry;
pub mod output;
pub mod pool;
pub mod quote;
pub mod replay;
pub mod run;
