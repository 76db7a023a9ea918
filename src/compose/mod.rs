// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Patch and scaffold composition
//!
//! A [`Patch`] is a self-contained sub-mesh whose outer boundary is cut into
//! sides. A [`Scaffold`] is a coarse mesh whose faces are filled with patches;
//! [`Scaffold::build`] unions them and welds the seams.

mod fit;
mod patch;
mod scaffold;

pub use fit::fit_similarity;
pub use patch::{Patch, DEFAULT_FIT_EPSILON};
pub use scaffold::Scaffold;
