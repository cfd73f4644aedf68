// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.

use scanwerk_core::error::Result;

/// Everything the scanner needs from the host platform.
pub trait PlatformBridge: NativeCamera {
    /// Human-readable name of the platform (for logs and diagnostics).
    fn platform_name(&self) -> &str;
}

/// Still-image capture from a device camera.
pub trait NativeCamera {
    /// Take one photo. Returns the encoded image (JPEG or PNG), or `None` if
    /// the user cancelled.
    fn capture_image(&self) -> Result<Option<Vec<u8>>>;
}
