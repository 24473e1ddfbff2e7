// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Model sources
//!
//! Anything that can serialize itself to OpenSCAD text can be shown by the
//! widget: raw source strings, model trees, or files on disk.

use crate::model::Node;
use crate::request::{RenderOptions, RenderRequest};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Something that serializes to OpenSCAD source text
pub trait ScadSource {
    fn to_scad(&self) -> String;

    /// Build a render request from the serialized source
    fn to_request(&self, options: RenderOptions) -> RenderRequest {
        RenderRequest::with_options(self.to_scad(), options)
    }
}

impl ScadSource for Node {
    fn to_scad(&self) -> String {
        Node::to_scad(self)
    }
}

impl ScadSource for str {
    fn to_scad(&self) -> String {
        self.to_string()
    }
}

impl ScadSource for String {
    fn to_scad(&self) -> String {
        self.clone()
    }
}

impl<T: ScadSource + ?Sized> ScadSource for &T {
    fn to_scad(&self) -> String {
        (**self).to_scad()
    }
}

/// Read a `.scad` file
pub fn read_scad_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).with_context(|| format!("Failed to read SCAD file: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_scad_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "cube([10, 10, 10]);")?;

        let source = read_scad_file(file.path())?;
        assert_eq!(source.to_request(RenderOptions::new()).source_text(), "cube([10, 10, 10]);\n");
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let err = read_scad_file("/nonexistent/model.scad").unwrap_err();
        assert!(err.to_string().contains("Failed to read SCAD file"));
    }

    #[test]
    fn test_equal_models_share_fingerprint() {
        let a = Node::cube(1.0, 2.0, 3.0) + Node::sphere(1.0);
        let b = Node::cube(1.0, 2.0, 3.0) + Node::sphere(1.0);
        let text = a.to_scad();
        assert_eq!(
            a.to_request(RenderOptions::new()).fingerprint(),
            b.to_request(RenderOptions::new()).fingerprint()
        );
        assert_eq!(
            text.as_str().to_request(RenderOptions::new()).fingerprint(),
            a.to_request(RenderOptions::new()).fingerprint()
        );
    }
}
