//! Domain model shared by the tracker and its front ends.

pub mod domain;
