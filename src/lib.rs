//! kiln - instruction-list core for a register-VM code generator.
//!
//! The crate stores a compilation unit's IR instructions as a doubly linked
//! sequence, answers the def/use queries ("does instruction X read/write
//! virtual register R?") consumed by register allocation and dead-code
//! elimination, resolves branch-target operands and renders finished units
//! to a textual assembly or binary bytecode backend.
//!
//! # Primary Usage
//!
//! ```
//! use kiln::ir::{read_bit, write_bit, Instruction, OperandTable, RegClass, Unit};
//!
//! let mut regs = OperandTable::new();
//! let dst = regs.reg("x", RegClass::Int);
//! let src = regs.reg("y", RegClass::Int);
//!
//! // The owning compiler builds the unit by repeated emit calls...
//! let mut unit = Unit::new();
//! let add = unit.emit(Instruction::new(
//!     "add",
//!     "%s, %s",
//!     &[dst, src],
//!     write_bit(0) | read_bit(1),
//! ));
//!
//! // ...and passes query it while mutating the list in place.
//! assert!(unit.writes(add, dst));
//! assert!(unit.reads(&regs, add, src));
//! ```
//!
//! # Architecture
//!
//! - [`ir`] - Operands, opcode table, instructions, units, def/use queries
//! - [`emit`] - Instruction rendering plus the textual and bytecode backends
//! - [`error`] - Error types surfaced to the compilation driver

pub mod emit;
pub mod error;
pub mod ir;

pub use emit::{render_text, BytecodeEmitter, BytecodeSink, TextEmitter};
pub use error::{EmitError, EmitResult};
pub use ir::{
    CallRole, InsRef, Instruction, OpId, OpTable, Operand, OperandRef, OperandTable, RegClass,
    Unit,
};
