//! fnpack-lib: dependency-aware packaging of serverless functions.
//!
//! This crate turns a single entry source file into a deployable archive:
//! - `source`: scanning of module references and removal of type syntax
//! - `graph`: FIFO walk of the local import graph with specifier rewriting
//! - `layout`: collision-free deployment paths for every discovered file
//! - `resolve`: module classification and package descriptor lookup
//! - `manifest`: the deterministic package descriptor
//! - `install`, `archive`: dependency installation and deterministic zips
//! - `bundle`: pure planning, staging, cache check, install and archive

pub mod archive;
pub mod bundle;
pub mod consts;
pub mod graph;
pub mod install;
pub mod layout;
pub mod manifest;
pub mod platform;
pub mod resolve;
pub mod source;
pub mod util;
