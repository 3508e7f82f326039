//! A small WebAssembly engine: binary decoder and i32 stack-machine
//! interpreter.
//!
//! wasmlet decodes the MVP binary format into a [`parser::Module`] and runs
//! its functions by walking their raw bytecode. Only 32-bit integer values
//! are supported; imports, exports, tables and globals are not.
//!
//! # Modules
//!
//! - [`parser`] -- Binary format decoder. Reads `.wasm` bytes into a [`parser::Module`].
//! - [`runtime`] -- Interpreter, operand stack, frames and linear memory.
//! - [`encoder`] -- Builder for module binaries in the supported subset.
//!
//! # Example
//!
//! Decode a module whose start function adds its two arguments, then run it:
//!
//! ```
//! let wasm = [
//!     0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
//!     0x01, 0x07, 0x01, 0x60, 0x02, 0x7f, 0x7f, 0x01, 0x7f, // (i32, i32) -> i32
//!     0x03, 0x02, 0x01, 0x00, // one function of type 0
//!     0x08, 0x01, 0x00, // start function 0
//!     0x0a, 0x09, 0x01, 0x07, 0x00, 0x20, 0x00, 0x20, 0x01, 0x6a, 0x0b, // body
//! ];
//!
//! let mut module = wasmlet::parse(&wasm).unwrap();
//! assert_eq!(wasmlet::execute(&mut module, &[2, 3]).unwrap(), vec![5]);
//! ```

pub mod encoder;
pub mod parser;
pub mod runtime;

pub use parser::{parse, DecodeError, Module};
pub use runtime::{execute, invoke, ExecutionError, RuntimeError};
