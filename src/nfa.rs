//! Fixed-capacity nondeterministic finite automaton.
//!
//! States and symbols are dense integer ranges; transitions are kept in
//! both a forward (`δ`) and a backward (`δ⁻¹`) table so that
//! [`Nfa::merge_states`] can rewrite incoming edges without scanning every
//! state. The bidirectional invariant, `q' ∈ forward[q,a] ⇔ q ∈
//! backward[q',a]`, holds before and after every public mutation.

use crate::bitset::Bitset;

/// Letter in the automaton's alphabet.
pub type Symbol = u8;

/// Offset of a sample's first symbol within the shared sample buffer.
pub type Index = usize;

/// Upper bound on live states an [`Nfa`] can hold.
pub const MAX_STATES: usize = crate::bitset::MAX_BITS;

/// Upper bound on alphabet size.
pub const MAX_SYMBOLS: usize = 32;

const TABLE_LEN: usize = MAX_STATES * MAX_SYMBOLS;

const _: () = assert!(MAX_STATES <= crate::bitset::MAX_BITS);
const _: () = assert!(MAX_SYMBOLS <= u8::MAX as usize);

/// A state identifier, always `< MAX_STATES`.
pub type State = usize;

/// `(Q, Σ, δ, I, F)` with `Q` fixed at [`MAX_STATES`] and `Σ` of runtime
/// size `symbols ≤ MAX_SYMBOLS`.
///
/// Every field is a fixed-size array, so [`Nfa`] is `Copy`: cloning is a
/// flat value copy, exactly as in the source's `nfa_clone` (`*dest =
/// *src`), with no heap allocation.
#[derive(Clone, Copy)]
pub struct Nfa {
    initials: Bitset,
    finals: Bitset,
    forward: [Bitset; TABLE_LEN],
    backward: [Bitset; TABLE_LEN],
    symbols: Symbol,
}

impl Nfa {
    /// An NFA with no states marked initial/final and no transitions, over
    /// an alphabet of the given size.
    pub fn new(symbols: Symbol) -> Nfa {
        assert!(
            symbols as usize <= MAX_SYMBOLS,
            "alphabet size {} exceeds MAX_SYMBOLS ({})",
            symbols,
            MAX_SYMBOLS
        );
        Nfa {
            initials: Bitset::new(),
            finals: Bitset::new(),
            forward: [Bitset::new(); TABLE_LEN],
            backward: [Bitset::new(); TABLE_LEN],
            symbols,
        }
    }

    /// Always [`MAX_STATES`]: the automaton exposes its fixed capacity.
    /// Tracking which ids are actually "live" is the caller's job (see the
    /// OIL engine's `pool`).
    #[inline]
    pub fn get_states(&self) -> usize {
        MAX_STATES
    }

    /// Size of the alphabet this automaton was initialized with.
    #[inline]
    pub fn get_symbols(&self) -> Symbol {
        self.symbols
    }

    fn check_state(&self, q: State) {
        assert!(q < self.get_states(), "state {} out of range", q);
    }

    fn check_symbol(&self, a: Symbol) {
        assert!(
            (a as usize) < self.symbols as usize,
            "symbol {} out of range (alphabet size {})",
            a,
            self.symbols
        );
    }

    fn offset(&self, q: State, a: Symbol) -> usize {
        q * self.symbols as usize + a as usize
    }

    pub fn add_initial(&mut self, q: State) {
        self.check_state(q);
        self.initials.add(q);
    }

    pub fn remove_initial(&mut self, q: State) {
        self.check_state(q);
        self.initials.remove(q);
    }

    pub fn is_initial(&self, q: State) -> bool {
        self.check_state(q);
        self.initials.contains(q)
    }

    pub fn get_initials(&self) -> Bitset {
        self.initials
    }

    pub fn add_final(&mut self, q: State) {
        self.check_state(q);
        self.finals.add(q);
    }

    pub fn remove_final(&mut self, q: State) {
        self.check_state(q);
        self.finals.remove(q);
    }

    pub fn is_final(&self, q: State) -> bool {
        self.check_state(q);
        self.finals.contains(q)
    }

    pub fn get_finals(&self) -> Bitset {
        self.finals
    }

    /// Successors of `(state, sym)`, i.e. `δ(state, sym)`.
    pub fn get_successors(&self, state: State, sym: Symbol) -> Bitset {
        self.check_state(state);
        self.check_symbol(sym);
        self.forward[self.offset(state, sym)]
    }

    /// Predecessors of `(state, sym)`, i.e. `δ⁻¹(state, sym)`.
    pub fn get_predecessors(&self, state: State, sym: Symbol) -> Bitset {
        self.check_state(state);
        self.check_symbol(sym);
        self.backward[self.offset(state, sym)]
    }

    /// Adds `q0 --a--> q1`. Idempotent.
    pub fn add_transition(&mut self, q0: State, q1: State, a: Symbol) {
        self.check_state(q0);
        self.check_state(q1);
        self.check_symbol(a);
        let fwd = self.offset(q0, a);
        self.forward[fwd].add(q1);
        let bwd = self.offset(q1, a);
        self.backward[bwd].add(q0);
    }

    /// Removes `q0 --a--> q1`. Idempotent on absent edges.
    pub fn remove_transition(&mut self, q0: State, q1: State, a: Symbol) {
        self.check_state(q0);
        self.check_state(q1);
        self.check_symbol(a);
        let fwd = self.offset(q0, a);
        self.forward[fwd].remove(q1);
        let bwd = self.offset(q1, a);
        self.backward[bwd].remove(q0);
    }

    /// Collapses `q2` into `q1`: `q1` inherits every incoming and outgoing
    /// transition of `q2`, plus its initial/final flags. `q2` is isolated
    /// afterwards. A self-loop on `q2` becomes a self-loop on `q1`.
    pub fn merge_states(&mut self, q1: State, q2: State) {
        self.check_state(q1);
        self.check_state(q2);

        if self.is_initial(q2) {
            self.add_initial(q1);
            self.remove_initial(q2);
        }
        if self.is_final(q2) {
            self.add_final(q1);
            self.remove_final(q2);
        }

        for a in 0..self.symbols {
            // Snapshot by copy-out before mutating, so the live edit below
            // never invalidates the set we're iterating.
            let preds = self.get_predecessors(q2, a);
            let mut it = preds.first();
            while let Some(cur) = it {
                let p = cur.element();
                self.add_transition(p, q1, a);
                self.remove_transition(p, q2, a);
                it = preds.next(cur);
            }

            let succs = self.get_successors(q2, a);
            let mut it = succs.first();
            while let Some(cur) = it {
                let r = cur.element();
                self.add_transition(q1, r, a);
                self.remove_transition(q2, r, a);
                it = succs.next(cur);
            }
        }
    }

    /// Subset-construction acceptance of `sample`. The empty string is
    /// accepted iff `initials ∩ finals` is non-empty.
    pub fn accept_sample(&self, sample: &[Symbol]) -> bool {
        let mut current = self.initials;

        for &sym in sample {
            let mut next = Bitset::new();
            let mut any = false;
            let mut it = current.first();
            while let Some(cur) = it {
                let state = cur.element();
                next.union(&self.get_successors(state, sym));
                any = true;
                it = current.next(cur);
            }
            if !any {
                return false;
            }
            current = next;
        }

        current.intersect(&self.finals);
        current.any()
    }

    fn sample_at<'b>(buffer: &'b [Symbol], sample_length: usize, idx: Index) -> &'b [Symbol] {
        assert!(
            idx + sample_length <= buffer.len(),
            "sample index {} (length {}) out of buffer range (len {})",
            idx,
            sample_length,
            buffer.len()
        );
        &buffer[idx..idx + sample_length]
    }

    /// Whether any of `buffer[indices[k]..indices[k]+sample_length]` is
    /// accepted.
    pub fn accept_any_sample(
        &self,
        buffer: &[Symbol],
        sample_length: usize,
        indices: &[Index],
    ) -> bool {
        indices
            .iter()
            .any(|&idx| self.accept_sample(Self::sample_at(buffer, sample_length, idx)))
    }

    /// Whether every `buffer[indices[k]..indices[k]+sample_length]` is
    /// accepted.
    pub fn accept_all_samples(
        &self,
        buffer: &[Symbol],
        sample_length: usize,
        indices: &[Index],
    ) -> bool {
        indices
            .iter()
            .all(|&idx| self.accept_sample(Self::sample_at(buffer, sample_length, idx)))
    }

    /// Count of `indices[k]` whose sample is accepted.
    pub fn accept_samples(
        &self,
        buffer: &[Symbol],
        sample_length: usize,
        indices: &[Index],
    ) -> usize {
        indices
            .iter()
            .filter(|&&idx| self.accept_sample(Self::sample_at(buffer, sample_length, idx)))
            .count()
    }
}

/// Renders `nfa` the way [`nfa_print`] does, without touching stdout. Used
/// by tests that want to compare dumps.
pub fn nfa_dump(nfa: &Nfa) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for q in 0..nfa.get_states() {
        let has_successors = (0..nfa.symbols).any(|a| nfa.get_successors(q, a).any());
        if !has_successors {
            continue;
        }

        write!(
            out,
            "{}{}{}",
            q,
            if nfa.is_initial(q) { "I" } else { "" },
            if nfa.is_final(q) { "F" } else { "" }
        )
        .unwrap();

        for a in 0..nfa.symbols {
            write!(out, " |{}>", a).unwrap();
            let succ = nfa.get_successors(q, a);
            let mut first = true;
            for r in succ.iter() {
                if !first {
                    write!(out, ", ").unwrap();
                }
                write!(out, "{}", r).unwrap();
                first = false;
            }
        }
        out.push('\n');
    }
    out
}

/// Writes a textual dump of `nfa`'s states with outgoing transitions to
/// standard output, one state per line: `Q[I][F] |a>t1, t2, … |b>…`.
/// States with no outgoing transitions are omitted.
pub fn nfa_print(nfa: &Nfa) {
    print!("{}", nfa_dump(nfa));
}
