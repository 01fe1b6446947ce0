// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

pub mod args;
pub mod config;
