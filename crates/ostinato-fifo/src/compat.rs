//! Compatibility layer for no_std + alloc.

pub use alloc::{boxed::Box, sync::Arc, vec::Vec};

pub use core::sync::atomic::{AtomicUsize, Ordering};
