// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

mod descriptor;
mod digest;

pub use self::descriptor::{Lower, OverlaySpec};
pub use self::digest::{Digest, Invalid};
