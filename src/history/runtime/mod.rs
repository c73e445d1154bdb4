//! The imperative shell around the normalizer.
//!
//! `HistoryView` listens to the scheduler, performs the fetch through a
//! `HistoryFetchClient`, feeds the response to `normalize` and keeps the result
//! for the hosting view to read.

pub mod view;


pub use view::{CyclePhase, HistorySnapshot, HistoryView};
