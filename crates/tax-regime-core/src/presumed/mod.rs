//! Lucro Presumido: income taxes on a statutory fraction of revenue.

pub mod calculator;

pub use calculator::{PresumedDetail, PresumedInput, PresumedProfitCalculator};
