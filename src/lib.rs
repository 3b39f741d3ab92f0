//! cmdwrap - Container command definitions and their resolution
//!
//! cmdwrap models the documents that describe a containerized analysis
//! tool and the "wrappers" that adapt it to a data archive: which archive
//! objects feed which command-line inputs, which files get mounted, and
//! where the outputs get uploaded.
//!
//! # Architecture
//!
//! - [`core`] - Definition schema, validation, ordering, permissions, config
//! - [`resolve`] - Flattening resolved inputs and assembling launch records
//! - [`secrets`] - Secret resolution abstraction
//!
//! # Correctness Invariants
//!
//! 1. Derived inputs are processed only after the inputs they derive from
//! 2. Output handlers are processed only after the objects they attach to
//! 3. A launch record is produced only when every required input has a value
//! 4. Raw values containing illegal strings never reach the engine
//! 5. Secret values are never logged

pub mod core;
pub mod resolve;
pub mod secrets;
