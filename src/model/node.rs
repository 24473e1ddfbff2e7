// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CAD model nodes

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// 3D Vector type alias
pub type Vec3 = nalgebra::Vector3<f32>;

/// A node of a parametric model: a primitive, a boolean, or a transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    /// Caller-assigned identity. Never part of the emitted source.
    pub id: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self { kind, id: None }
    }

    pub fn with_id(kind: NodeKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
        }
    }

    pub fn cube(x: f32, y: f32, z: f32) -> Self {
        Self::new(NodeKind::Cube {
            size: Vec3::new(x, y, z),
            center: false,
        })
    }

    pub fn sphere(r: f32) -> Self {
        Self::new(NodeKind::Sphere { r, fn_: 0 })
    }

    pub fn cylinder(h: f32, r: f32) -> Self {
        Self::new(NodeKind::Cylinder {
            h,
            r1: r,
            r2: r,
            center: false,
            fn_: 0,
        })
    }

    pub fn cone(h: f32, r1: f32, r2: f32) -> Self {
        Self::new(NodeKind::Cylinder {
            h,
            r1,
            r2,
            center: false,
            fn_: 0,
        })
    }

    /// Verbatim OpenSCAD statement(s)
    pub fn raw(source: impl Into<String>) -> Self {
        Self::new(NodeKind::Raw(source.into()))
    }

    pub fn union(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Union(children))
    }

    pub fn difference(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Difference(children))
    }

    pub fn intersection(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Intersection(children))
    }

    /// Center a cube or cylinder on the origin
    pub fn centered(mut self) -> Self {
        match &mut self.kind {
            NodeKind::Cube { center, .. } | NodeKind::Cylinder { center, .. } => *center = true,
            _ => {}
        }
        self
    }

    /// Set `$fn` on a round primitive
    pub fn segments(mut self, n: u32) -> Self {
        match &mut self.kind {
            NodeKind::Sphere { fn_, .. } | NodeKind::Cylinder { fn_, .. } => *fn_ = n,
            _ => {}
        }
        self
    }

    pub fn translate(self, x: f32, y: f32, z: f32) -> Self {
        self.transformed(TransformOp::Translate(Vec3::new(x, y, z)))
    }

    pub fn rotate(self, x: f32, y: f32, z: f32) -> Self {
        self.transformed(TransformOp::Rotate(Vec3::new(x, y, z)))
    }

    pub fn scale(self, x: f32, y: f32, z: f32) -> Self {
        self.transformed(TransformOp::Scale(Vec3::new(x, y, z)))
    }

    pub fn mirror(self, x: f32, y: f32, z: f32) -> Self {
        self.transformed(TransformOp::Mirror(Vec3::new(x, y, z)))
    }

    pub fn multmatrix(self, m: nalgebra::Matrix4<f32>) -> Self {
        self.transformed(TransformOp::Multmatrix(m))
    }

    fn transformed(self, op: TransformOp) -> Self {
        Self::new(NodeKind::Transform {
            op,
            children: vec![self],
        })
    }
}

/// Types of model nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // Primitives
    Cube {
        size: Vec3,
        center: bool,
    },
    Sphere {
        r: f32,
        fn_: u32,
    },
    Cylinder {
        h: f32,
        r1: f32,
        r2: f32,
        center: bool,
        fn_: u32,
    },
    Raw(String),

    // Boolean operations
    Union(Vec<Node>),
    Difference(Vec<Node>),
    Intersection(Vec<Node>),

    // Transformations
    Transform {
        op: TransformOp,
        children: Vec<Node>,
    },

    // Empty node
    Empty,
}

impl NodeKind {
    pub fn get_children(&self) -> &[Node] {
        match self {
            NodeKind::Union(children)
            | NodeKind::Difference(children)
            | NodeKind::Intersection(children)
            | NodeKind::Transform { children, .. } => children,
            _ => &[],
        }
    }
}

/// Transformation operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransformOp {
    Translate(Vec3),
    Rotate(Vec3),
    Scale(Vec3),
    Mirror(Vec3),
    Multmatrix(nalgebra::Matrix4<f32>),
}

// `a + b`, `a - b` and `a * b` build union, difference and intersection,
// flattening chains of the same operation.

impl Add for Node {
    type Output = Node;

    fn add(self, rhs: Node) -> Node {
        match self.kind {
            NodeKind::Union(mut children) if self.id.is_none() => {
                children.push(rhs);
                Node::union(children)
            }
            kind => Node::union(vec![Node { kind, id: self.id }, rhs]),
        }
    }
}

impl Sub for Node {
    type Output = Node;

    fn sub(self, rhs: Node) -> Node {
        match self.kind {
            NodeKind::Difference(mut children) if self.id.is_none() => {
                children.push(rhs);
                Node::difference(children)
            }
            kind => Node::difference(vec![Node { kind, id: self.id }, rhs]),
        }
    }
}

impl Mul for Node {
    type Output = Node;

    fn mul(self, rhs: Node) -> Node {
        match self.kind {
            NodeKind::Intersection(mut children) if self.id.is_none() => {
                children.push(rhs);
                Node::intersection(children)
            }
            kind => Node::intersection(vec![Node { kind, id: self.id }, rhs]),
        }
    }
}
