//! Incremental display of a streaming answer

pub mod live;
