//! Textual assembly backend.
//!
//! Writes one line per instruction: a tab, the opcode name and the rendered
//! operands. Labels and bare directives print their rendered form alone.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::render_text;
use crate::error::{EmitError, EmitResult};
use crate::ir::{OperandTable, Unit};

/// Textual output backend over any writable destination.
pub struct TextEmitter<W: Write> {
    out: W,
}

impl TextEmitter<BufWriter<File>> {
    /// Open a file destination. Failure to obtain a writable destination is
    /// a fatal, reported error that halts compilation.
    pub fn open(path: &Path) -> EmitResult<Self> {
        let file = File::create(path).map_err(|source| EmitError::OpenOutput {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("writing textual output to {}", path.display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TextEmitter<W> {
    /// Wrap an already open destination.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Flush the whole unit, head to tail, one line per instruction.
    pub fn flush_unit(&mut self, regs: &OperandTable, unit: &Unit) -> EmitResult<()> {
        log::debug!("flushing unit of {} instructions", unit.len());
        for (_, ins) in unit.iter() {
            let body = render_text(regs, ins)?;
            if ins.is_label() || ins.opname().is_empty() {
                writeln!(self.out, "{body}")?;
            } else {
                writeln!(self.out, "\t{} {}", ins.opname(), body)?;
            }
        }
        Ok(())
    }

    /// Release the destination, flushing buffered output.
    pub fn close(mut self) -> EmitResult<()> {
        self.out.flush()?;
        Ok(())
    }
}
