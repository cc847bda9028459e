/// Data organization utilities for the bird report service.
///
/// Group-by, distinct and date normalization helpers over the ordered
/// observation sequence. Every routine is a pure transform: records are
/// borrowed, never rewritten.
///
/// Submodules:
/// - `groupings` - accumulate-then-sort aggregation and date parsing.

pub mod groupings;
