//! String similarity scoring used to rank catalog candidates.

pub mod similarity;
