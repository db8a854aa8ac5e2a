//! IR instructions and their per-operand role bitmasks.

use super::opcodes::{CallRole, OpId, OpTable};
use super::operand::OperandRef;
use super::unit::InsRef;

/// Fixed capacity of the operand list of a single instruction.
pub const MAX_OPERANDS: usize = 16;

/// Structural tag: this instruction is a label.
pub const KIND_LABEL: u32 = 1 << 16;
/// Structural tag: this instruction is the call of a calling-convention
/// sequence; its argument/result operands live on neighboring pseudo-ops.
pub const KIND_CALL: u32 = 1 << 17;

/// Role-bitmask bit marking operand slot `slot` as read.
pub const fn read_bit(slot: usize) -> u32 {
    1 << slot
}

/// Role-bitmask bit marking operand slot `slot` as written.
pub const fn write_bit(slot: usize) -> u32 {
    1 << (16 + slot)
}

/// Kind-bitmask bit marking operand slot `slot` as a branch target.
pub const fn branch_bit(slot: usize) -> u32 {
    1 << slot
}

/// One node of the intermediate representation.
///
/// The opcode name and format template are owned by the instruction;
/// operands are non-owning [`OperandRef`]s into the front end's table. The
/// shape (opcode, format, operands, role bits) is fixed at construction,
/// only the list links and the source line mutate afterwards.
#[derive(Debug)]
pub struct Instruction {
    opname: String,
    format: String,
    operands: Vec<OperandRef>,
    /// Read roles in bits 0..16, write roles in bits 16..32.
    flags: u32,
    /// Structural tags: branch-target slot bits plus `KIND_*` flags.
    pub kind: u32,
    op: Option<OpId>,
    role: CallRole,
    /// Source line, 0 while unset.
    pub line: u32,
    pub(crate) prev: Option<InsRef>,
    pub(crate) next: Option<InsRef>,
}

impl Instruction {
    /// Create an unlinked instruction.
    ///
    /// The opcode-table link starts unset; bind it with [`bind_op`]
    /// once the surrounding compiler has resolved the opcode.
    ///
    /// [`bind_op`]: Instruction::bind_op
    pub fn new(opname: &str, format: &str, operands: &[OperandRef], flags: u32) -> Self {
        assert!(
            operands.len() <= MAX_OPERANDS,
            "operand count {} exceeds capacity {MAX_OPERANDS}",
            operands.len()
        );
        // Role bits past the populated slots must never be set.
        let valid = if operands.is_empty() {
            0
        } else {
            let per_slot = (1u32 << operands.len()) - 1;
            per_slot | per_slot << 16
        };
        debug_assert_eq!(flags & !valid, 0, "role bits set beyond operand count");

        Self {
            opname: opname.to_string(),
            format: format.to_string(),
            operands: operands.to_vec(),
            flags,
            kind: 0,
            op: None,
            role: CallRole::Ordinary,
            line: 0,
            prev: None,
            next: None,
        }
    }

    /// Attach the opcode-table entry and cache its calling-convention role.
    pub fn bind_op(&mut self, id: OpId, table: &OpTable) {
        self.op = Some(id);
        self.role = table.info(id).role;
    }

    pub fn opname(&self) -> &str {
        &self.opname
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn operands(&self) -> &[OperandRef] {
        &self.operands
    }

    pub fn operand(&self, slot: usize) -> Option<OperandRef> {
        self.operands.get(slot).copied()
    }

    pub fn op(&self) -> Option<OpId> {
        self.op
    }

    pub fn role(&self) -> CallRole {
        self.role
    }

    /// Whether operand slot `slot` is read.
    pub fn reads_slot(&self, slot: usize) -> bool {
        self.flags & read_bit(slot) != 0
    }

    /// Whether operand slot `slot` is written.
    pub fn writes_slot(&self, slot: usize) -> bool {
        self.flags & write_bit(slot) != 0
    }

    pub fn is_label(&self) -> bool {
        self.kind & KIND_LABEL != 0
    }

    pub fn is_call(&self) -> bool {
        self.kind & KIND_CALL != 0
    }
}
