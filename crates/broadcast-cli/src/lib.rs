//! `bcast` command-line interface
//!
//! Wires the discovery pipeline to a project on disk: configuration and
//! manifests from `broadcast-config`, source reflection from
//! `broadcast-parser`, orchestration and artifact output from
//! `broadcast-pipeline`.

pub mod cli;
pub mod commands;
pub mod output;
