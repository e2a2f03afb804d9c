//! bitemporal - Version and revision history for identified structures
//!
//! Business time is tracked by versions, system time by revisions.
//! Corrections always append a revision; nothing stored is rewritten.

pub mod cli;
pub mod config;
pub mod mutator;
pub mod observability;
pub mod persistence;
pub mod storage;
pub mod temporal;
