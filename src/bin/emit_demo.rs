//! Demo driver: build a small routine and flush it through a backend.
//!
//! Constructs a unit the way a front end would — a label, some arithmetic,
//! a keyed fetch and a calling-convention sequence — allocates a few
//! registers by hand and renders the result.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use kiln::ir::{
    branch_bit, read_bit, write_bit, Instruction, OpTable, OperandTable, RegClass, Unit,
    KIND_CALL, KIND_LABEL,
};
use kiln::{EmitResult, TextEmitter};

#[derive(Parser)]
#[command(about = "Build a demo routine and emit it as textual assembly")]
struct Args {
    /// Write the rendered unit to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn build_demo(regs: &mut OperandTable, ops: &mut OpTable, unit: &mut Unit) {
    let counter = regs.reg("counter", RegClass::Int);
    let step = regs.constant("1", RegClass::Int);
    let greeting = regs.constant("hello", RegClass::Str);
    let idx_key = regs.key("counter", Some(counter));
    let keyed = regs.keyed("table_at", &[idx_key]);
    let result = regs.reg("result", RegClass::Obj);
    let target = regs.reg("_loop", RegClass::Int);

    regs.set_color(counter, 0);

    let mut label = Instruction::new("", "_loop:", &[], 0);
    label.kind |= KIND_LABEL;
    unit.emit(label);

    let add = ops.register("add");
    let mut ins = Instruction::new(
        "add",
        "%s, %s, %s",
        &[counter, counter, step],
        write_bit(0) | read_bit(1) | read_bit(2),
    );
    ins.bind_op(add, ops);
    ins.line = 2;
    unit.emit(ins);

    let set = ops.register("set");
    let mut ins = Instruction::new(
        "set",
        "%s, %s",
        &[result, keyed],
        write_bit(0) | read_bit(1),
    );
    ins.bind_op(set, ops);
    ins.line = 3;
    unit.emit(ins);

    let set_args = ops.lookup("set_args").expect("core op");
    let mut ins = Instruction::new("set_args", "\"(0)\", %s", &[greeting], read_bit(0));
    ins.bind_op(set_args, ops);
    ins.line = 4;
    unit.emit(ins);

    let invoke = ops.register("invokecc");
    let mut ins = Instruction::new("invokecc", "%s", &[result], read_bit(0));
    ins.bind_op(invoke, ops);
    ins.kind |= KIND_CALL;
    ins.line = 4;
    unit.emit(ins);

    let branch = ops.register("branch");
    let mut ins = Instruction::new("branch", "%s", &[target], 0);
    ins.bind_op(branch, ops);
    ins.kind |= branch_bit(0);
    ins.line = 5;
    unit.emit(ins);
}

fn run(args: &Args) -> EmitResult<()> {
    let mut regs = OperandTable::new();
    let mut ops = OpTable::new();
    let mut unit = Unit::new();
    build_demo(&mut regs, &mut ops, &mut unit);

    match &args.output {
        Some(path) => {
            let mut emitter = TextEmitter::open(path)?;
            emitter.flush_unit(&regs, &unit)?;
            emitter.close()
        }
        None => {
            let stdout = io::stdout();
            let mut emitter = TextEmitter::new(stdout.lock());
            emitter.flush_unit(&regs, &unit)?;
            emitter.close()
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        let mut msg = format!("error: {e}");
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            msg.push_str(&format!("\n  caused by: {cause}"));
            source = cause.source();
        }
        let _ = writeln!(io::stderr(), "{msg}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
