//! Process-wide logging facility.
//!
//! Starts out as a no-op router so code can log before (or without)
//! configuration. [`install`] replaces the whole router atomically;
//! records emitted afterwards never reach the previous destinations.
//! Components that prefer an explicit handle can hold an
//! `Arc<LeveledRouter>` instead and ignore this module.

use crate::record::Field;
use crate::router::LeveledRouter;
use arc_swap::ArcSwap;
use std::error::Error;
use std::sync::{Arc, LazyLock};

static GLOBAL: LazyLock<ArcSwap<LeveledRouter>> =
    LazyLock::new(|| ArcSwap::from_pointee(LeveledRouter::noop()));

/// Replace the process-wide router, returning the previous one.
pub fn install(router: Arc<LeveledRouter>) -> Arc<LeveledRouter> {
    GLOBAL.swap(router)
}

/// Put the no-op router back.
pub fn reset() -> Arc<LeveledRouter> {
    install(Arc::new(LeveledRouter::noop()))
}

pub fn current() -> Arc<LeveledRouter> {
    GLOBAL.load_full()
}

#[track_caller]
pub fn debug(message: &str, fields: &[Field]) {
    GLOBAL.load().debug(message, fields);
}

#[track_caller]
pub fn info(message: &str, fields: &[Field]) {
    GLOBAL.load().info(message, fields);
}

#[track_caller]
pub fn warn(message: &str, fields: &[Field]) {
    GLOBAL.load().warn(message, fields);
}

#[track_caller]
pub fn error(message: &str, err: &dyn Error) {
    GLOBAL.load().error(message, err);
}
