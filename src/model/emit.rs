// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! OpenSCAD source emitter
//!
//! Output is deterministic: the same tree always yields byte-identical
//! text, so structurally equal models share a fingerprint.

use super::node::{Node, NodeKind, TransformOp, Vec3};
use std::fmt::Write;

const INDENT: &str = "  ";

impl Node {
    /// Serialize to OpenSCAD source text
    pub fn to_scad(&self) -> String {
        let mut out = String::new();
        emit(self, 0, &mut out);
        out
    }
}

fn emit(node: &Node, depth: usize, out: &mut String) {
    let pad = INDENT.repeat(depth);
    match &node.kind {
        NodeKind::Cube { size, center } => {
            let _ = writeln!(out, "{}cube({}{});", pad, vec3(size), center_arg(*center));
        }
        NodeKind::Sphere { r, fn_ } => {
            let _ = writeln!(out, "{}sphere(r = {}{});", pad, num(*r), fn_arg(*fn_));
        }
        NodeKind::Cylinder {
            h,
            r1,
            r2,
            center,
            fn_,
        } => {
            let radii = if r1 == r2 {
                format!("r = {}", num(*r1))
            } else {
                format!("r1 = {}, r2 = {}", num(*r1), num(*r2))
            };
            let _ = writeln!(
                out,
                "{}cylinder(h = {}, {}{}{});",
                pad,
                num(*h),
                radii,
                center_arg(*center),
                fn_arg(*fn_)
            );
        }
        NodeKind::Raw(source) => {
            for line in source.lines() {
                if line.trim().is_empty() {
                    out.push('\n');
                } else {
                    let _ = writeln!(out, "{}{}", pad, line);
                }
            }
        }
        NodeKind::Union(children) => block(&pad, "union()", children, depth, out),
        NodeKind::Difference(children) => block(&pad, "difference()", children, depth, out),
        NodeKind::Intersection(children) => block(&pad, "intersection()", children, depth, out),
        NodeKind::Transform { op, children } => {
            block(&pad, &transform_header(op), children, depth, out)
        }
        NodeKind::Empty => {}
    }
}

fn block(pad: &str, header: &str, children: &[Node], depth: usize, out: &mut String) {
    if children.is_empty() {
        let _ = writeln!(out, "{}{};", pad, header);
        return;
    }
    let _ = writeln!(out, "{}{} {{", pad, header);
    for child in children {
        emit(child, depth + 1, out);
    }
    let _ = writeln!(out, "{}}}", pad);
}

fn transform_header(op: &TransformOp) -> String {
    match op {
        TransformOp::Translate(v) => format!("translate({})", vec3(v)),
        TransformOp::Rotate(v) => format!("rotate({})", vec3(v)),
        TransformOp::Scale(v) => format!("scale({})", vec3(v)),
        TransformOp::Mirror(v) => format!("mirror({})", vec3(v)),
        TransformOp::Multmatrix(m) => {
            let rows: Vec<String> = (0..4)
                .map(|r| {
                    let cells: Vec<String> = (0..4).map(|c| num(m[(r, c)])).collect();
                    format!("[{}]", cells.join(", "))
                })
                .collect();
            format!("multmatrix([{}])", rows.join(", "))
        }
    }
}

fn center_arg(center: bool) -> &'static str {
    if center {
        ", center = true"
    } else {
        ""
    }
}

fn fn_arg(segments: u32) -> String {
    if segments == 0 {
        String::new()
    } else {
        format!(", $fn = {}", segments)
    }
}

fn vec3(v: &Vec3) -> String {
    format!("[{}, {}, {}]", num(v.x), num(v.y), num(v.z))
}

/// Shortest decimal form; `-0` prints as `0`
pub(crate) fn num(value: f32) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        // OpenSCAD has no literal for these
        return if value.is_nan() {
            "(0/0)".to_string()
        } else if value > 0.0 {
            "(1/0)".to_string()
        } else {
            "(-1/0)".to_string()
        };
    }
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives() {
        assert_eq!(Node::cube(10.0, 20.0, 30.0).to_scad(), "cube([10, 20, 30]);\n");
        assert_eq!(
            Node::cube(1.5, 1.0, 1.0).centered().to_scad(),
            "cube([1.5, 1, 1], center = true);\n"
        );
        assert_eq!(
            Node::sphere(2.0).segments(64).to_scad(),
            "sphere(r = 2, $fn = 64);\n"
        );
        assert_eq!(
            Node::cone(5.0, 2.0, 0.0).to_scad(),
            "cylinder(h = 5, r1 = 2, r2 = 0);\n"
        );
    }

    #[test]
    fn test_nested_layout() {
        let model = (Node::cube(10.0, 10.0, 10.0).centered()
            - Node::sphere(6.0).translate(0.0, 0.0, 2.0))
        .rotate(0.0, 0.0, 45.0);
        let expected = "\
rotate([0, 0, 45]) {
  difference() {
    cube([10, 10, 10], center = true);
    translate([0, 0, 2]) {
      sphere(r = 6);
    }
  }
}
";
        assert_eq!(model.to_scad(), expected);
    }

    #[test]
    fn test_deterministic_and_identity_free() {
        let a = Node::with_id(NodeKind::Sphere { r: 1.0, fn_: 0 }, "first");
        let b = Node::with_id(NodeKind::Sphere { r: 1.0, fn_: 0 }, "second");
        assert_eq!(a.to_scad(), b.to_scad());
        assert_eq!(a.to_scad(), a.clone().to_scad());
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(num(-0.0), "0");
        assert_eq!(num(0.25), "0.25");
        assert_eq!(num(-3.0), "-3");
        assert_eq!(num(f32::INFINITY), "(1/0)");
    }

    #[test]
    fn test_multmatrix_and_raw() {
        let node = Node::raw("linear_extrude(2)\n  square(1);").multmatrix(nalgebra::Matrix4::identity());
        let text = node.to_scad();
        assert!(text.starts_with("multmatrix([[1, 0, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0], [0, 0, 0, 1]]) {\n"));
        assert!(text.contains("  linear_extrude(2)\n    square(1);\n"));
        assert_eq!(Node::new(NodeKind::Empty).to_scad(), "");
        assert_eq!(Node::union(vec![]).to_scad(), "union();\n");
    }
}
