//! Output format writers.

mod csv;
mod json;
mod progress;
mod writer;

pub use csv::CsvWriter;
pub use json::{ClipsPayload, JsonWriter, RangePayload};
pub use progress::{create_block_progress, finish_progress, inc_progress};
pub use writer::{OutputWriter, RangeOutput, create_writer};
