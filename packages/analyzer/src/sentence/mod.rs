//! Sentence layer.
//!
//! Where spans serve declaration detection, this layer addresses text by
//! `Sentence` element:
//!
//! - [`env`]: one [`SentenceEnv`](env::SentenceEnv) per sentence plus a
//!   sentence-indexed container tree
//! - [`ranges`]: container references to coalesced sentence text ranges
//! - [`tokens`]: law-number and pointer-range tokens

pub mod env;
pub mod ranges;
pub mod tokens;

pub use env::{get_sentence_envs, SentenceEnv, SentenceEnvs};
pub use ranges::{to_sentence_text_ranges, ContainerIdRange};
pub use tokens::{detect_tokens, Tokens};
