//! Fixed-capacity nondeterministic-automaton learning, after the OIL
//! algorithm of Garcia et al.: build an NFA that accepts every given
//! positive sample and rejects every given negative one.

mod bitset;
mod config;
mod nfa;
mod oil;

pub use bitset::{Bitset, BitsetElements, BitsetIter, Bucket, MAX_BITS, MAX_BUCKETS, WORD_BITS};
pub use config::{ConfigError, SampleSet};
pub use nfa::{nfa_dump, nfa_print, Index, Nfa, State, Symbol, MAX_STATES, MAX_SYMBOLS};
pub use oil::{oil, oil_with_options, OilOptions};
