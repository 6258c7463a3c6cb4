//! Integration tests for cloudxfer-engine
//!
//! Runs whole batches against an in-memory remote storage and checks the
//! aggregate counts, progress invariants, duplicate policies, the streaming
//! chunk bound and folder-tree planning.

mod common;

mod test_batch;
mod test_tree;
