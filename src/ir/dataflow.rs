// This module implements the def/use analyzer and branch-target resolution.
// The two queries, reads and writes, decide whether an instruction reads or
// writes a given operand. Most instructions answer straight from their
// per-slot role bitmasks, but the calling-convention pseudo-ops need special
// handling: set_args/set_returns stage operands that are logically read by
// the call, and get_params/get_results capture operands that are logically
// written by it. Those pseudo-ops are separate instructions adjacent to the
// call, so the queries walk the list to the matching partner, identified by
// its opcode-table role rather than by distance. Keyed operands additionally
// propagate reads to the registers backing their key chain. These queries run
// on every instruction pair during register allocation and must stay cheap.

//! Def/use queries and branch-target resolution.

use super::inst::{branch_bit, Instruction};
use super::opcodes::CallRole;
use super::operand::{OperandRef, OperandTable};
use super::unit::{InsRef, Unit};

impl Unit {
    /// Does the instruction at `at` read `reg`?
    pub fn reads(&self, regs: &OperandTable, at: InsRef, reg: OperandRef) -> bool {
        let ins = self.get(at);

        match ins.role() {
            // The producer pseudo-ops read exactly the operands they stage.
            CallRole::SetArgs | CallRole::SetReturns => {
                return ins.operands().contains(&reg);
            }
            // The consumer pseudo-ops never read.
            CallRole::GetParams | CallRole::GetResults => return false,
            CallRole::Ordinary => {}
        }

        for (slot, &r) in ins.operands().iter().enumerate() {
            if !ins.reads_slot(slot) {
                continue;
            }
            if r == reg {
                return true;
            }
            // A keyed container also reads the registers backing its keys.
            let operand = regs.get(r);
            if operand.is_keyed {
                let mut key = operand.next_key;
                while let Some(k) = key {
                    let elem = regs.get(k);
                    if elem.backing == Some(reg) {
                        return true;
                    }
                    key = elem.next_key;
                }
            }
        }

        // A call reads the arguments staged by the nearest preceding
        // set_args. A malformed sequence with no producer contributes
        // nothing.
        if ins.is_call() {
            let mut cur = Some(at);
            while let Some(c) = cur {
                let candidate = self.get(c);
                if candidate.role() == CallRole::SetArgs {
                    return candidate.operands().contains(&reg);
                }
                cur = candidate.prev;
            }
        }

        false
    }

    /// Does the instruction at `at` write `reg`?
    pub fn writes(&self, at: InsRef, reg: OperandRef) -> bool {
        let ins = self.get(at);

        // A get_results occurs after the actual call; it writes its own
        // operands even when the call sits right next to it.
        if ins.role() == CallRole::GetResults {
            return ins.operands().contains(&reg);
        }

        // The write information for a call lives on the matching
        // get_results. The scan starts at the predecessor so a result
        // capture attached immediately before the call is found too.
        if ins.is_call() {
            let mut cur = self.get(at).prev;
            while let Some(c) = cur {
                let candidate = self.get(c);
                if candidate.role() == CallRole::GetResults {
                    return candidate.operands().contains(&reg);
                }
                cur = candidate.next;
            }
            return false;
        }

        match ins.role() {
            CallRole::GetParams => return ins.operands().contains(&reg),
            CallRole::SetArgs | CallRole::SetReturns => return false,
            _ => {}
        }

        ins.operands()
            .iter()
            .enumerate()
            .any(|(slot, &r)| ins.writes_slot(slot) && r == reg)
    }
}

impl Instruction {
    /// Operand slot denoting this instruction's control-transfer target.
    ///
    /// At most one slot carries the branch bit; the scan runs from the
    /// highest populated slot downward because operand order varies by
    /// opcode.
    pub fn branch_target_slot(&self) -> Option<usize> {
        (0..self.operands().len())
            .rev()
            .find(|&slot| self.kind & branch_bit(slot) != 0)
    }

    /// Operand denoting this instruction's control-transfer target.
    pub fn branch_target(&self) -> Option<OperandRef> {
        self.branch_target_slot().and_then(|slot| self.operand(slot))
    }
}
