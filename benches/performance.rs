// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scadview::engine::{Engine, EngineKind, EngineOutput, EngineStatus};
use scadview::request::{parse_defines, Fingerprint, RenderRequest};
use scadview::{Node, RenderCache, RenderCoordinator, RenderError, RenderMode, RendererConfig, ScadSource};
use std::sync::Arc;
use std::time::Duration;

struct Immediate;

impl Engine for Immediate {
    fn kind(&self) -> EngineKind {
        EngineKind::Local
    }

    fn probe(&self) -> EngineStatus {
        EngineStatus::Available
    }

    fn render(
        &self,
        _request: &RenderRequest,
        _fingerprint: &Fingerprint,
        _timeout: Duration,
    ) -> Result<EngineOutput, RenderError> {
        Ok(EngineOutput::Bytes(vec![0u8; 1024]))
    }
}

fn model(count: usize) -> Node {
    (0..count).fold(Node::cube(20.0, 20.0, 20.0).centered(), |acc, i| {
        acc - Node::sphere(2.0).segments(32).translate(i as f32, 0.0, 10.0)
    })
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");
    let options = parse_defines(&["$fn=64", "format=stl", "scale=1.5"]).unwrap();

    for size in [1usize, 100, 1000] {
        let request = model(size).to_request(options.clone());
        group.bench_with_input(
            BenchmarkId::new("request", request.source_text().len()),
            &request,
            |b, request| b.iter(|| black_box(request).fingerprint()),
        );
    }

    group.finish();
}

fn bench_emit(c: &mut Criterion) {
    let node = model(200);
    c.bench_function("emit_200_subtractions", |b| {
        b.iter(|| black_box(&node).to_scad())
    });
}

fn bench_cache_hit(c: &mut Criterion) {
    let coordinator = RenderCoordinator::new(
        RendererConfig {
            mode: RenderMode::Local,
            ..RendererConfig::default()
        },
        Arc::new(RenderCache::default()),
    )
    .with_engine(Arc::new(Immediate));
    let request = RenderRequest::new(model(50).to_scad());
    coordinator.select_and_render(&request);

    c.bench_function("select_and_render_cached", |b| {
        b.iter(|| coordinator.select_and_render(black_box(&request)))
    });
}

criterion_group!(benches, bench_fingerprint, bench_emit, bench_cache_hit);
criterion_main!(benches);
