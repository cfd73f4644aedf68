// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk — Native platform bridge abstractions.
//
// Defines the traits the scanner uses to reach device capabilities (the
// camera) and picks the implementation for the target platform.

pub mod stub;
pub mod traits;

pub use traits::{NativeCamera, PlatformBridge};

/// Bridge implementation for the current platform.
///
/// Desktop and CI builds get [`stub::StubBridge`], whose camera always reports
/// `PlatformUnavailable`.
pub fn platform_bridge() -> Box<dyn PlatformBridge> {
    Box::new(stub::StubBridge)
}
