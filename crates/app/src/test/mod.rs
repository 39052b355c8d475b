//! Shared test support.

mod context;

pub(crate) use context::TestContext;
pub(crate) use db::TestDb;
pub(crate) use products::{FakeProductKind, FakeProductSpec, HookCall};
