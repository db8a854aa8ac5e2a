//! Opcode table and calling-convention roles.
//!
//! The table is owned by the surrounding compiler and handed to the core
//! read-only. The analyzer only ever needs to recognize the four
//! calling-convention pseudo-ops, so each entry's role is resolved to a
//! [`CallRole`] once and instructions cache it when they are bound to their
//! table entry.

use hashbrown::HashMap;

/// Stable index of an opcode within its [`OpTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpId(pub(crate) u32);

/// Calling-convention role of an opcode.
///
/// The producer ops stage arguments/returns before a call; the consumer ops
/// capture parameters/results after it. Everything else is `Ordinary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallRole {
    Ordinary,
    SetArgs,
    SetReturns,
    GetParams,
    GetResults,
}

/// Metadata for one opcode.
#[derive(Debug, Clone)]
pub struct OpInfo {
    pub name: String,
    pub role: CallRole,
}

/// Maps opcode names to [`OpId`]s and ids to metadata.
#[derive(Debug)]
pub struct OpTable {
    ops: Vec<OpInfo>,
    by_name: HashMap<String, OpId>,
}

impl Default for OpTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OpTable {
    /// New table with the four calling-convention pseudo-ops pre-registered.
    pub fn new() -> Self {
        let mut table = Self {
            ops: Vec::new(),
            by_name: HashMap::new(),
        };
        table.register_role("set_args", CallRole::SetArgs);
        table.register_role("get_params", CallRole::GetParams);
        table.register_role("set_returns", CallRole::SetReturns);
        table.register_role("get_results", CallRole::GetResults);
        table
    }

    fn register_role(&mut self, name: &str, role: CallRole) -> OpId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = OpId(self.ops.len() as u32);
        self.ops.push(OpInfo {
            name: name.to_string(),
            role,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Register an ordinary opcode; returns the existing id if the name is
    /// already known.
    pub fn register(&mut self, name: &str) -> OpId {
        self.register_role(name, CallRole::Ordinary)
    }

    pub fn lookup(&self, name: &str) -> Option<OpId> {
        self.by_name.get(name).copied()
    }

    pub fn info(&self, id: OpId) -> &OpInfo {
        &self.ops[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
