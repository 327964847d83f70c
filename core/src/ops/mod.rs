//! Geometry operations on lines and regions: mask synthesis, cutting and
//! merging. Everything here is a pure function over entity geometry; the
//! editor applies the results and takes care of ids, ordering and
//! notifications.

pub mod cut;
pub mod mask;
pub mod merge;

pub use cut::{cut_line, cut_region, LineCut, LinePiece};
pub use mask::{canonical_normal, line_height, synthesize_mask, LineHeights};
pub use merge::{merge_geometry, merge_order};

#[cfg(test)]
mod tests_mask;
#[cfg(test)]
mod tests_merge;
