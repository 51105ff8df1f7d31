//! The two release workflows behind the `push` and `build` subcommands.
//!
//! Each pipeline is a plain struct holding its collaborators behind traits
//! so the full sequence can run against scripted git and docker output, a
//! mock completion client and an in-memory forge. `execute` wires the real
//! implementations from CLI arguments.
//!
//! Steps run strictly in order. A failure aborts the run and completed
//! steps are not rolled back.

/// Commit message generation, changelog, commit, push and pull request
/// upsert for feature branches; tag and push for the mainline branch.
pub mod push;

/// Multi-arch image build and VERSION bump.
pub mod build;
