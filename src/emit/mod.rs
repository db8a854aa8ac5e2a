// This module renders instructions and flushes finished units to an output
// backend. render_text turns one instruction into its textual assembly form:
// labels and bare directives print their format template verbatim, everything
// else interpolates per-operand display strings into the printf-style
// template. Display strings follow the allocation state: colored registers
// print as class tag plus slot number, keyed operands as a semicolon-joined
// access path, unquoted string constants gain quotes, and constant wrappers
// unwrap to their canonical register first. Templates accept one to six
// substitution points; anything else is a code-generation defect surfaced as
// an error to the compilation driver. The textual and bytecode backends live
// in the text and bytecode submodules; exactly one is active per compilation.

//! Rendering and output backends.

use crate::error::{EmitError, EmitResult};
use crate::ir::{Instruction, OperandRef, OperandTable, RegClass};

pub mod bytecode;
pub mod text;

pub use bytecode::{BytecodeEmitter, BytecodeSink};
pub use text::TextEmitter;

/// Highest operand count a format template may consume.
pub const MAX_FORMAT_ARITY: usize = 6;

/// Render one instruction as text.
///
/// Labels, comments and bare directives (no operands, or a template without
/// substitution markers) come back verbatim. Operand counts outside
/// 1..=[`MAX_FORMAT_ARITY`] are a fatal configuration error.
pub fn render_text(regs: &OperandTable, ins: &Instruction) -> EmitResult<String> {
    if ins.operands().is_empty() || !ins.format().contains('%') {
        return Ok(ins.format().to_string());
    }

    let arity = ins.operands().len();
    if arity > MAX_FORMAT_ARITY {
        return Err(EmitError::UnhandledArity {
            opname: ins.opname().to_string(),
            format: ins.format().to_string(),
            arity,
        });
    }

    let fields: Vec<String> = ins
        .operands()
        .iter()
        .map(|&r| operand_display(regs, r))
        .collect();
    Ok(interpolate(ins.format(), &fields))
}

/// Display string for a single operand.
fn operand_display(regs: &OperandTable, r: OperandRef) -> String {
    let mut p = regs.get(r);
    // Constant wrappers print as the canonical register they alias.
    if let Some(w) = p.wraps {
        p = regs.get(w);
    }

    if p.color >= 0 && p.needs_alloc() {
        return format!("{}{}", p.class.tag(), p.color);
    }

    if p.is_keyed {
        let mut out = String::new();
        let mut key = p.next_key;
        while let Some(k) = key {
            let elem = regs.get(k);
            match elem.backing.map(|b| regs.get(b)) {
                Some(backing) if backing.color >= 0 => {
                    out.push_str(&format!("{}{}", backing.class.tag(), backing.color));
                }
                _ => out.push_str(&elem.name),
            }
            key = elem.next_key;
            if key.is_some() {
                out.push(';');
            }
        }
        return out;
    }

    if p.is_const
        && p.class == RegClass::Str
        && !p.name.starts_with('"')
        && !p.name.starts_with('\'')
    {
        return format!("\"{}\"", p.name);
    }

    p.name.clone()
}

/// Substitute `%s` markers in `format` with the display strings in order.
fn interpolate(format: &str, fields: &[String]) -> String {
    let mut out = String::with_capacity(format.len() + 8 * fields.len());
    let mut next = 0;
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('s') if next < fields.len() => {
                chars.next();
                out.push_str(&fields[next]);
                next += 1;
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }
    out
}
