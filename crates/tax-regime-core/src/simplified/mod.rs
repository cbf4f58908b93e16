//! Simples Nacional: one progressive levy substituting most taxes.

pub mod calculator;

pub use calculator::{
    effective_rate, AnnexSelection, SimplifiedDetail, SimplifiedInput,
    SimplifiedRegimeCalculator, SublimitCarveOut,
};
