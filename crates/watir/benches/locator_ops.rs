//! Locator Operations Benchmarks
//!
//! Selector validation, XPath building, and in-memory lookups through the
//! mock driver.
//!
//! Run with: `cargo bench --bench locator_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use regex::Regex;
use std::sync::Arc;
use watir::prelude::*;
use watir::{How, MockDriver, MockNode, SelectorBuilder};

fn bench_selector_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector_building");

    let cases = vec![
        ("id", ElementKind::HtmlElement, selector!(id: "submit")),
        ("class_list", ElementKind::Div, selector!(class: "btn btn-lg !hidden")),
        ("text", ElementKind::Button, selector!(text: "Sign in")),
        ("label", ElementKind::TextField, selector!(label: "User name")),
        ("typed_input", ElementKind::CheckBox, selector!(name: "agree", index: 2)),
        (
            "regex_filter",
            ElementKind::Anchor,
            selector!(href: Regex::new("^/docs/").unwrap()),
        ),
        ("xpath", ElementKind::HtmlElement, Selector::xpath("//main//p")),
    ];

    for (name, kind, selector) in cases {
        let builder = SelectorBuilder::new(kind);
        group.bench_with_input(BenchmarkId::from_parameter(name), &selector, |bench, sel| {
            bench.iter(|| {
                let strategy = builder.build(black_box(sel)).unwrap();
                black_box(strategy);
            });
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    let mock = Arc::new(MockDriver::new());
    let sel = selector!(id: "target");
    let query = SelectorBuilder::new(ElementKind::HtmlElement)
        .build(&sel)
        .unwrap()
        .query()
        .unwrap()
        .1
        .to_string();
    let node = mock.add(MockNode::new("p").text("hello"));
    mock.respond(How::XPath, query, vec![node]);
    let browser = Browser::with_config(mock.clone(), Config::new().with_default_timeout(0.0));

    group.bench_function("fresh_handle_text", |bench| {
        bench.iter(|| {
            let text = browser.element(black_box(sel.clone())).text().unwrap();
            black_box(text);
        });
    });

    let cached = browser.element(sel.clone());
    group.bench_function("cached_handle_text", |bench| {
        bench.iter(|| {
            black_box(cached.text().unwrap());
        });
    });

    for size in [10_usize, 100] {
        let nodes: Vec<_> = (0..size)
            .map(|i| mock.add(MockNode::new("li").text(format!("item {i}"))))
            .collect();
        let list_sel = selector!(class: format!("list-{size}"));
        let query = SelectorBuilder::new(ElementKind::HtmlElement)
            .build(&list_sel)
            .unwrap()
            .query()
            .unwrap()
            .1
            .to_string();
        mock.respond(How::XPath, query, nodes);
        group.bench_with_input(BenchmarkId::new("collection", size), &list_sel, |bench, s| {
            bench.iter(|| {
                let count = browser.elements(s.clone()).len().unwrap();
                black_box(count);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_selector_building, bench_lookup);
criterion_main!(benches);
