//! CLI command implementations

pub(crate) mod column;
pub(crate) mod common;
pub(crate) mod explore;
pub(crate) mod flow;
pub(crate) mod graph;
pub(crate) mod impact;
pub(crate) mod serve;
