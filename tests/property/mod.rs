// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-based test modules

mod allocation;
mod tag_resolution;
