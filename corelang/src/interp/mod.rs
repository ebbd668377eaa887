//! Tree-walking interpreter with a reference-counted memory model
//!
//! `eval` walks the syntax tree and drives `memory`, which owns every
//! binding, the array heap and the transcript of observable events.

mod error;
mod eval;
mod heap;
mod memory;
mod transcript;
mod value;

pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::Interpreter;
pub use heap::{ArrayId, Heap};
pub use memory::{CallStack, Frame, FrameStack, MemoryStore, SharedRef};
pub use transcript::{Event, Transcript};
pub use value::{Binding, Value};
