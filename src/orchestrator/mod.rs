//! Application-level orchestration.
//!
//! This module owns the submission lifecycle (one ingest in flight at a time)
//! and dispatches download triggers. UI layers talk to it through commands and
//! receive `FormEvent`s back.

mod controller;

pub(crate) use controller::{run_controller, Services, UiCommand};
