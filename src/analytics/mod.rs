//! Per-session view tracking and its aggregates.

pub mod tracker;
