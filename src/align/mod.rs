pub mod global;
pub mod matrix;

pub use global::{
    global_alignment, global_aminoacid_alignment, global_nucleotide_alignment, GlobalAlignment,
    MarginMode,
};
pub use matrix::ScoringMatrix;
