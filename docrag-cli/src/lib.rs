//! Command-line front end for [`docrag`].
//!
//! ```text
//! docrag index corpus_a ALLERG_IA
//! docrag query corpus_a "persistent cough at night" --top-k 5 --threshold 0.7
//! docrag --preset sapbert --model sapbert-pubmed index corpus_b ALLERG_IA
//! docrag collections delete --all
//! ```

pub mod cli;
pub mod commands;

pub use cli::Cli;
pub use commands::run;
