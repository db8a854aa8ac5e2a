// This module implements the Unit container and its list-splice engine. A unit
// owns the instruction sequence of one compiled routine as a doubly linked
// list. Instructions live in a slab addressed by stable InsRef indices, so
// splice operations rewire plain indices instead of pointers while staying
// O(1). The engine offers the mutations optimization passes need: unlink,
// delete, insert before/after an anchor, replace in place, and move with a
// returned continuation point for forward traversals. Line numbers of newly
// spliced instructions inherit from their neighbors so diagnostics stay
// traceable after transformation.

//! Compilation units and the list-splice engine.
//!
//! A [`Unit`] is the doubly linked instruction list of one routine. The
//! owning compiler fills it with [`Unit::emit`]; optimization passes mutate
//! it in place through the splice operations, all of which preserve the
//! head/tail and `prev`/`next` invariants and run in O(1).

use super::inst::Instruction;

/// Stable index of an instruction within its [`Unit`]'s slab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InsRef(u32);

/// The instruction list of one compiled routine.
#[derive(Debug, Default)]
pub struct Unit {
    slots: Vec<Option<Instruction>>,
    free: Vec<u32>,
    head: Option<InsRef>,
    tail: Option<InsRef>,
    linked: usize,
}

impl Unit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instructions currently linked into the list.
    pub fn len(&self) -> usize {
        self.linked
    }

    pub fn is_empty(&self) -> bool {
        self.linked == 0
    }

    pub fn head(&self) -> Option<InsRef> {
        self.head
    }

    pub fn tail(&self) -> Option<InsRef> {
        self.tail
    }

    pub fn get(&self, r: InsRef) -> &Instruction {
        self.slots[r.0 as usize]
            .as_ref()
            .expect("stale instruction reference")
    }

    pub fn get_mut(&mut self, r: InsRef) -> &mut Instruction {
        self.slots[r.0 as usize]
            .as_mut()
            .expect("stale instruction reference")
    }

    pub fn next(&self, r: InsRef) -> Option<InsRef> {
        self.get(r).next
    }

    pub fn prev(&self, r: InsRef) -> Option<InsRef> {
        self.get(r).prev
    }

    /// Allocate an instruction without linking it into the list.
    ///
    /// Pair with the splice operations to place it.
    pub fn add(&mut self, ins: Instruction) -> InsRef {
        debug_assert!(ins.prev.is_none() && ins.next.is_none());
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx as usize] = Some(ins);
                InsRef(idx)
            }
            None => {
                let idx = self.slots.len() as u32;
                self.slots.push(Some(ins));
                InsRef(idx)
            }
        }
    }

    /// Append an instruction at the tail of the list.
    ///
    /// This is the build loop of the owning compiler; passes use the splice
    /// operations instead.
    pub fn emit(&mut self, ins: Instruction) -> InsRef {
        let r = self.add(ins);
        match self.tail {
            None => {
                self.head = Some(r);
                self.tail = Some(r);
            }
            Some(t) => {
                self.get_mut(t).next = Some(r);
                self.get_mut(r).prev = Some(t);
                self.tail = Some(r);
            }
        }
        self.linked += 1;
        r
    }

    /// Remove `ins` from the list without freeing it.
    ///
    /// Returns the instruction that followed it, if any.
    pub fn unlink(&mut self, ins: InsRef) -> Option<InsRef> {
        let prev = self.get(ins).prev;
        let next = self.get(ins).next;

        match prev {
            Some(p) => self.get_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.get_mut(n).prev = prev,
            None => self.tail = prev,
        }

        let node = self.get_mut(ins);
        node.prev = None;
        node.next = None;
        self.linked -= 1;
        next
    }

    /// Remove `ins` from the list and free it.
    ///
    /// Returns the instruction that followed it, if any.
    pub fn delete(&mut self, ins: InsRef) -> Option<InsRef> {
        log::trace!("delete {:?} ({})", ins, self.get(ins).opname());
        let next = self.unlink(ins);
        self.release(ins);
        next
    }

    /// Splice `node` into the list immediately after `anchor`.
    ///
    /// With no anchor, `node` becomes the new head. An unset line number on
    /// `node` inherits from its new neighbor.
    pub fn insert_after(&mut self, anchor: Option<InsRef>, node: InsRef) {
        match anchor {
            None => {
                let old_head = self.head;
                self.head = Some(node);
                self.get_mut(node).next = old_head;
                match old_head {
                    Some(h) => {
                        self.get_mut(h).prev = Some(node);
                        let line = self.get(h).line;
                        let node = self.get_mut(node);
                        if node.line == 0 {
                            node.line = line;
                        }
                    }
                    None => self.tail = Some(node),
                }
            }
            Some(a) => {
                let next = self.get(a).next;
                self.get_mut(a).next = Some(node);
                {
                    let line = self.get(a).line;
                    let n = self.get_mut(node);
                    n.prev = Some(a);
                    n.next = next;
                    if n.line == 0 {
                        n.line = line;
                    }
                }
                match next {
                    Some(n) => self.get_mut(n).prev = Some(node),
                    None => self.tail = Some(node),
                }
            }
        }
        self.linked += 1;
    }

    /// Splice `node` into the list immediately before `anchor`.
    ///
    /// With no anchor, `node` becomes the new head and takes over the former
    /// head's line number; inserting into an empty unit this way is a caller
    /// bug.
    pub fn insert_before(&mut self, anchor: Option<InsRef>, node: InsRef) {
        match anchor {
            None => {
                let old_head = self.head.expect("insert_before on an empty unit");
                self.head = Some(node);
                self.get_mut(old_head).prev = Some(node);
                let line = self.get(old_head).line;
                let n = self.get_mut(node);
                n.next = Some(old_head);
                n.line = line;
            }
            Some(a) => {
                let prev = self.get(a).prev;
                self.get_mut(a).prev = Some(node);
                {
                    let line = self.get(a).line;
                    let n = self.get_mut(node);
                    n.next = Some(a);
                    n.prev = prev;
                    if n.line == 0 {
                        n.line = line;
                    }
                }
                match prev {
                    Some(p) => self.get_mut(p).next = Some(node),
                    None => self.head = Some(node),
                }
            }
        }
        self.linked += 1;
    }

    /// Splice `new` into `old`'s position.
    ///
    /// `old` is left unlinked, or freed when `free_old` is set. An unset
    /// line number on `new` inherits `old`'s.
    pub fn replace(&mut self, old: InsRef, new: InsRef, free_old: bool) {
        let prev = self.get(old).prev;
        let next = self.get(old).next;
        let line = self.get(old).line;

        match prev {
            Some(p) => self.get_mut(p).next = Some(new),
            None => self.head = Some(new),
        }
        match next {
            Some(n) => self.get_mut(n).prev = Some(new),
            None => self.tail = Some(new),
        }
        {
            let n = self.get_mut(new);
            n.prev = prev;
            n.next = next;
            if n.line == 0 {
                n.line = line;
            }
        }
        {
            let o = self.get_mut(old);
            o.prev = None;
            o.next = None;
        }
        if free_old {
            self.release(old);
        }
    }

    /// Move `ins` from its current position to the one following `after`.
    ///
    /// Returns the instruction that followed `ins`'s original position so a
    /// forward traversal can continue past the relocation.
    pub fn move_after(&mut self, ins: InsRef, after: InsRef) -> Option<InsRef> {
        let next = self.unlink(ins);
        self.insert_after(Some(after), ins);
        next
    }

    /// Iterate instruction refs in program order.
    pub fn refs(&self) -> Refs<'_> {
        Refs {
            unit: self,
            cur: self.head,
        }
    }

    /// Iterate instructions in program order.
    pub fn iter(&self) -> impl Iterator<Item = (InsRef, &Instruction)> + '_ {
        self.refs().map(move |r| (r, self.get(r)))
    }

    fn release(&mut self, r: InsRef) {
        self.slots[r.0 as usize] = None;
        self.free.push(r.0);
    }
}

/// Forward iterator over the instruction refs of a [`Unit`].
pub struct Refs<'a> {
    unit: &'a Unit,
    cur: Option<InsRef>,
}

impl Iterator for Refs<'_> {
    type Item = InsRef;

    fn next(&mut self) -> Option<InsRef> {
        let r = self.cur?;
        self.cur = self.unit.get(r).next;
        Some(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str) -> Instruction {
        Instruction::new(name, name, &[], 0)
    }

    fn unit_of(names: &[&str]) -> (Unit, Vec<InsRef>) {
        let mut unit = Unit::new();
        let refs = names.iter().map(|n| unit.emit(noop(n))).collect();
        (unit, refs)
    }

    /// Walk forward from head and backward from tail, checking that both
    /// traversals agree and that every prev/next pair is mutually consistent.
    fn assert_well_linked(unit: &Unit, expect: &[InsRef]) {
        let forward: Vec<_> = unit.refs().collect();
        assert_eq!(forward, expect, "forward order");

        let mut backward = Vec::new();
        let mut cur = unit.tail();
        while let Some(r) = cur {
            backward.push(r);
            cur = unit.prev(r);
        }
        backward.reverse();
        assert_eq!(backward, expect, "backward order");

        assert_eq!(unit.head(), expect.first().copied());
        assert_eq!(unit.tail(), expect.last().copied());
        assert_eq!(unit.len(), expect.len());
        for w in expect.windows(2) {
            assert_eq!(unit.next(w[0]), Some(w[1]));
            assert_eq!(unit.prev(w[1]), Some(w[0]));
        }
        if let Some(&h) = expect.first() {
            assert_eq!(unit.prev(h), None);
        }
        if let Some(&t) = expect.last() {
            assert_eq!(unit.next(t), None);
        }
    }

    #[test]
    fn emit_builds_program_order() {
        let (unit, refs) = unit_of(&["a", "b", "c"]);
        assert_well_linked(&unit, &refs);
    }

    #[test]
    fn empty_unit_has_no_ends() {
        let unit = Unit::new();
        assert!(unit.is_empty());
        assert_eq!(unit.head(), None);
        assert_eq!(unit.tail(), None);
    }

    #[test]
    fn insert_then_delete_restores_list() {
        let (mut unit, refs) = unit_of(&["a", "b", "c"]);
        let x = unit.add(noop("x"));
        unit.insert_after(Some(refs[0]), x);
        assert_well_linked(&unit, &[refs[0], x, refs[1], refs[2]]);

        let next = unit.delete(x);
        assert_eq!(next, Some(refs[1]));
        assert_well_linked(&unit, &refs);
    }

    #[test]
    fn insert_after_none_becomes_head() {
        let (mut unit, refs) = unit_of(&["a", "b"]);
        let x = unit.add(noop("x"));
        unit.insert_after(None, x);
        assert_well_linked(&unit, &[x, refs[0], refs[1]]);
    }

    #[test]
    fn insert_after_none_into_empty_unit() {
        let mut unit = Unit::new();
        let x = unit.add(noop("x"));
        unit.insert_after(None, x);
        assert_well_linked(&unit, &[x]);
    }

    #[test]
    fn insert_before_anchor() {
        let (mut unit, refs) = unit_of(&["a", "b"]);
        let x = unit.add(noop("x"));
        unit.insert_before(Some(refs[1]), x);
        assert_well_linked(&unit, &[refs[0], x, refs[1]]);
    }

    #[test]
    fn insert_before_none_becomes_head() {
        let (mut unit, refs) = unit_of(&["a", "b"]);
        let x = unit.add(noop("x"));
        unit.insert_before(None, x);
        assert_well_linked(&unit, &[x, refs[0], refs[1]]);
    }

    #[test]
    fn delete_head_and_tail() {
        let (mut unit, refs) = unit_of(&["a", "b", "c"]);
        assert_eq!(unit.delete(refs[0]), Some(refs[1]));
        assert_well_linked(&unit, &refs[1..]);
        assert_eq!(unit.delete(refs[2]), None);
        assert_well_linked(&unit, &refs[1..2]);
        assert_eq!(unit.delete(refs[1]), None);
        assert!(unit.is_empty());
        assert_eq!(unit.head(), None);
        assert_eq!(unit.tail(), None);
    }

    #[test]
    fn move_after_keeps_length_and_returns_continuation() {
        let (mut unit, refs) = unit_of(&["a", "b", "c", "d"]);
        // Move b to follow c; the caller's forward scan resumes at c.
        let cont = unit.move_after(refs[1], refs[2]);
        assert_eq!(cont, Some(refs[2]));
        assert_well_linked(&unit, &[refs[0], refs[2], refs[1], refs[3]]);
    }

    #[test]
    fn replace_rewires_both_neighbors() {
        let (mut unit, refs) = unit_of(&["a", "b", "c"]);
        let x = unit.add(noop("x"));
        unit.replace(refs[1], x, true);
        assert_well_linked(&unit, &[refs[0], x, refs[2]]);
    }

    #[test]
    fn replace_at_head_and_tail_updates_ends() {
        let (mut unit, refs) = unit_of(&["a", "b"]);
        let x = unit.add(noop("x"));
        unit.replace(refs[0], x, true);
        assert_well_linked(&unit, &[x, refs[1]]);

        let y = unit.add(noop("y"));
        unit.replace(refs[1], y, true);
        assert_well_linked(&unit, &[x, y]);
    }

    #[test]
    fn spliced_instructions_inherit_lines() {
        let (mut unit, refs) = unit_of(&["a", "b"]);
        unit.get_mut(refs[0]).line = 7;
        unit.get_mut(refs[1]).line = 9;

        let x = unit.add(noop("x"));
        unit.insert_after(Some(refs[0]), x);
        assert_eq!(unit.get(x).line, 7);

        // An already set line is kept.
        let mut y = noop("y");
        y.line = 3;
        let y = unit.add(y);
        unit.insert_before(Some(refs[1]), y);
        assert_eq!(unit.get(y).line, 3);

        // Prepending takes over the former head's line.
        let z = unit.add(noop("z"));
        unit.insert_before(None, z);
        assert_eq!(unit.get(z).line, 7);

        let w = unit.add(noop("w"));
        unit.replace(refs[1], w, true);
        assert_eq!(unit.get(w).line, 9);
    }

    #[test]
    fn add_reuses_freed_slots() {
        let (mut unit, refs) = unit_of(&["a", "b"]);
        unit.delete(refs[0]);
        let x = unit.add(noop("x"));
        assert_eq!(x, refs[0]);
        unit.insert_after(Some(refs[1]), x);
        assert_well_linked(&unit, &[refs[1], x]);
    }
}
