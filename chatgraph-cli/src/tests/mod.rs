//! Unit tests for chatgraph-cli, organized by module.
//!
//! Each submodule documents the behaviour under test. Model calls use chatgraph's `MockLlm`.
