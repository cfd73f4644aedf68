// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where no native camera API is wired up.

use scanwerk_core::error::{Result, ScanwerkError};

use crate::traits::*;

/// Bridge returned on platforms without a native camera integration.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl NativeCamera for StubBridge {
    fn capture_image(&self) -> Result<Option<Vec<u8>>> {
        tracing::warn!("NativeCamera::capture_image called on stub bridge");
        Err(ScanwerkError::PlatformUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_camera_is_unavailable() {
        let bridge = StubBridge;
        assert_eq!(bridge.platform_name(), "Desktop (stub)");
        assert!(matches!(
            bridge.capture_image(),
            Err(ScanwerkError::PlatformUnavailable)
        ));
    }
}
