// File: ./src/parser/mod.rs
//! Turning language-model output into schedule entry drafts.
pub mod closer;
pub mod emit;
pub mod finalize;
pub mod sanitize;
pub mod stream;

pub use closer::{Closer, SuffixCloser};
pub use emit::{CollectingEmitter, Emitter, Framing, WriterEmitter};
pub use stream::{PartialRecordBuffer, StreamParser};
