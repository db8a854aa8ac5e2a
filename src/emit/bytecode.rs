//! Bytecode backend driving an external sink.
//!
//! The concrete bytecode encoding lives outside this crate; the emitter only
//! guarantees the sink's ordered lifecycle per unit — begin, one emit per
//! instruction in program order, end — bracketed by a single open/close per
//! compilation. Sink errors propagate unchanged as the error source.

use crate::error::{EmitError, EmitResult};
use crate::ir::{Instruction, OperandTable, Unit};

/// External bytecode encoder.
///
/// Implementations own their destination. The driver calls `open` once,
/// then per unit `begin_sub`, `emit_ins` for each instruction in program
/// order and `end_sub`, then `close` once.
pub trait BytecodeSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn open(&mut self) -> Result<(), Self::Error>;
    fn begin_sub(&mut self, unit: &Unit) -> Result<(), Self::Error>;
    fn emit_ins(
        &mut self,
        regs: &OperandTable,
        unit: &Unit,
        ins: &Instruction,
    ) -> Result<(), Self::Error>;
    fn end_sub(&mut self, unit: &Unit) -> Result<(), Self::Error>;
    fn close(&mut self) -> Result<(), Self::Error>;
}

/// Bytecode output backend wrapping an external [`BytecodeSink`].
pub struct BytecodeEmitter<S: BytecodeSink> {
    sink: S,
}

impl<S: BytecodeSink> BytecodeEmitter<S> {
    /// Acquire the backend, opening the sink.
    pub fn open(mut sink: S) -> EmitResult<Self> {
        sink.open().map_err(sink_error)?;
        Ok(Self { sink })
    }

    /// Flush the whole unit through the sink's subroutine lifecycle.
    pub fn flush_unit(&mut self, regs: &OperandTable, unit: &Unit) -> EmitResult<()> {
        log::debug!("flushing unit of {} instructions to bytecode sink", unit.len());
        self.sink.begin_sub(unit).map_err(sink_error)?;
        for (_, ins) in unit.iter() {
            self.sink.emit_ins(regs, unit, ins).map_err(sink_error)?;
        }
        self.sink.end_sub(unit).map_err(sink_error)?;
        Ok(())
    }

    /// Release the backend, closing the sink and handing it back.
    pub fn close(mut self) -> EmitResult<S> {
        self.sink.close().map_err(sink_error)?;
        Ok(self.sink)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

fn sink_error<E: std::error::Error + Send + Sync + 'static>(source: E) -> EmitError {
    EmitError::Sink {
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Instruction;
    use std::convert::Infallible;

    /// Sink that records the order of lifecycle calls.
    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<String>,
    }

    impl BytecodeSink for RecordingSink {
        type Error = Infallible;

        fn open(&mut self) -> Result<(), Infallible> {
            self.calls.push("open".into());
            Ok(())
        }

        fn begin_sub(&mut self, _unit: &Unit) -> Result<(), Infallible> {
            self.calls.push("begin_sub".into());
            Ok(())
        }

        fn emit_ins(
            &mut self,
            _regs: &OperandTable,
            _unit: &Unit,
            ins: &Instruction,
        ) -> Result<(), Infallible> {
            self.calls.push(format!("emit {}", ins.opname()));
            Ok(())
        }

        fn end_sub(&mut self, _unit: &Unit) -> Result<(), Infallible> {
            self.calls.push("end_sub".into());
            Ok(())
        }

        fn close(&mut self) -> Result<(), Infallible> {
            self.calls.push("close".into());
            Ok(())
        }
    }

    #[test]
    fn sink_lifecycle_runs_in_order() {
        let regs = OperandTable::new();
        let mut unit = Unit::new();
        unit.emit(Instruction::new("one", "one", &[], 0));
        unit.emit(Instruction::new("two", "two", &[], 0));

        let mut emitter = BytecodeEmitter::open(RecordingSink::default()).unwrap();
        emitter.flush_unit(&regs, &unit).unwrap();
        let sink = emitter.close().unwrap();

        assert_eq!(
            sink.calls,
            ["open", "begin_sub", "emit one", "emit two", "end_sub", "close"]
        );
    }

    /// Sink whose failures must reach the caller unchanged.
    struct FailingSink;

    #[derive(Debug, thiserror::Error)]
    #[error("sink exploded")]
    struct SinkExploded;

    impl BytecodeSink for FailingSink {
        type Error = SinkExploded;

        fn open(&mut self) -> Result<(), SinkExploded> {
            Ok(())
        }

        fn begin_sub(&mut self, _unit: &Unit) -> Result<(), SinkExploded> {
            Err(SinkExploded)
        }

        fn emit_ins(
            &mut self,
            _regs: &OperandTable,
            _unit: &Unit,
            _ins: &Instruction,
        ) -> Result<(), SinkExploded> {
            Ok(())
        }

        fn end_sub(&mut self, _unit: &Unit) -> Result<(), SinkExploded> {
            Ok(())
        }

        fn close(&mut self) -> Result<(), SinkExploded> {
            Ok(())
        }
    }

    #[test]
    fn sink_errors_carry_their_source() {
        use std::error::Error;

        let regs = OperandTable::new();
        let unit = Unit::new();
        let mut emitter = BytecodeEmitter::open(FailingSink).unwrap();
        let err = emitter.flush_unit(&regs, &unit).unwrap_err();
        let source = err.source().expect("sink error keeps its cause");
        assert!(source.downcast_ref::<SinkExploded>().is_some());
    }
}
