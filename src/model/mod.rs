// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Parametric model tree and its OpenSCAD emitter

mod emit;
pub mod node;

pub use node::{Node, NodeKind, TransformOp, Vec3};
