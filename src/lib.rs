// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! scadview
//!
//! Renderer selection, fallback and caching for an OpenSCAD notebook widget.
//! Renders go to the browser's WebAssembly build of OpenSCAD when the front
//! end supports it, or to a local OpenSCAD executable, and every outcome is
//! memoized by a content fingerprint of the source and its options.

pub mod bus;
pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod request;
pub mod selector;
pub mod source;
pub mod utils;

pub use bus::{InMemoryBus, PropertyBus, UiEvent, WidgetAdapter, WirePayload};
pub use cache::{CachePolicy, CacheStats, RenderCache};
pub use config::ScadViewConfig;
pub use engine::{BrowserEngine, Engine, EngineKind, EngineStatus, LocalEngine};
pub use error::{EngineAttempt, Remedy, RenderError};
pub use logging::init_logging;
pub use model::{Node, NodeKind, TransformOp};
pub use request::{CorrelationToken, Fingerprint, OptionValue, RenderOptions, RenderRequest, RenderResult};
pub use selector::{RenderCoordinator, RenderMode, RendererConfig};
pub use source::ScadSource;
