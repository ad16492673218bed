//! CLI argument parsing and command handling.

mod args;
pub mod validators;

pub use args::{
    ChunkArgs, ClipsArgs, Cli, Command, ConfigAction, DatasetArgs, GlobalArgs, RangeArgs,
};
