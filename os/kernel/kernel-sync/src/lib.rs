//! # Kernel synchronization primitives
//!
//! Only the busy-waiting [`SpinLock`] lives here; it is what the memory
//! trackers use once secondary CPUs share them.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod spin_lock;

pub use spin_lock::{SpinLock, SpinLockGuard};
