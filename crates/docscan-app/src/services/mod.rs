// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — bridges the command line to the docscan backend crates.
//
// `commands` runs each subcommand against the pipeline and writes its
// results; `data_dir` locates the per-user settings file.

pub mod commands;
pub mod data_dir;
