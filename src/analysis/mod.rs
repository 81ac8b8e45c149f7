/// Shared analysis primitives for the event detectors.
///
/// Submodules:
/// - `groupings` — turns a boolean condition into contiguous time runs.
/// - `frequency` — infers a series' nominal sampling interval.

pub mod frequency;
pub mod groupings;
