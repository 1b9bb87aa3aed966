//! Proposal domain module.
//!
//! A proposal is what the analysis service suggests doing with a piece of
//! input: an ordered list of file mutations plus a human-readable summary.
//!
//! - `model`: validated domain types (`Action`, `ActionMode`, `Proposal`)
//! - `raw`: the loosely-typed wire form returned by the model, and the
//!   per-action validation that turns it into a `Proposal`

mod model;
mod raw;

pub use model::{Action, ActionMode, Proposal, is_contained};
pub use raw::{RawAction, RawProposal};
