// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding/encoding, post-rectification adjustments, and the
// resampling helper shared with rectification.

pub mod adjust;
pub mod codec;
pub(crate) mod warp;

pub use adjust::ImageAdjuster;
