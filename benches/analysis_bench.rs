//! Benchmarks for parsing and workflow pattern mining.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use claude_meta::analytics::{detect_error_patterns, detect_file_churn, detect_idle_periods, detect_tool_sequences};
use claude_meta::model::extract_tool_calls;
use claude_meta::parser::JsonlParser;
use claude_meta::query::{build_successful_prompts, query, AggregateSpec, FilterSpec, QueryParams};

#[path = "../tests/generators/mod.rs"]
mod generators;

use generators::workload_session;

const SIZES: [usize; 3] = [10, 100, 1000];

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    for size in SIZES {
        let data = workload_session(size).to_jsonl();
        group.throughput(Throughput::Bytes(data.len() as u64));

        group.bench_with_input(BenchmarkId::new("parse_str", size), &data, |b, data| {
            b.iter(|| {
                let mut parser = JsonlParser::new();
                black_box(parser.parse_str(data))
            });
        });
    }

    group.finish();
}

fn bench_mining(c: &mut Criterion) {
    let mut group = c.benchmark_group("mining");

    for size in SIZES {
        let entries = workload_session(size).entries();
        group.throughput(Throughput::Elements(entries.len() as u64));

        group.bench_with_input(BenchmarkId::new("tool_calls", size), &entries, |b, entries| {
            b.iter(|| black_box(extract_tool_calls(entries)));
        });

        group.bench_with_input(BenchmarkId::new("error_patterns", size), &entries, |b, entries| {
            b.iter(|| {
                let calls = extract_tool_calls(entries);
                black_box(detect_error_patterns(entries, &calls))
            });
        });

        group.bench_with_input(BenchmarkId::new("sequences", size), &entries, |b, entries| {
            b.iter(|| black_box(detect_tool_sequences(entries, 2, 3).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("churn_idle", size), &entries, |b, entries| {
            b.iter(|| black_box((detect_file_churn(entries, 5), detect_idle_periods(entries, 5))));
        });

        group.bench_with_input(BenchmarkId::new("prompts", size), &entries, |b, entries| {
            b.iter(|| black_box(build_successful_prompts(entries, 0.8, 10)));
        });
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let entries = workload_session(1000).entries();
    let params = QueryParams {
        resource: "tools".into(),
        filter: FilterSpec {
            tool_name: "^(Bash|Edit)$".into(),
            ..FilterSpec::default()
        },
        aggregate: AggregateSpec {
            function: "count".into(),
            field: "status".into(),
        },
        ..QueryParams::default()
    };

    c.bench_function("query_tools_count_by_status", |b| {
        b.iter(|| black_box(query(&entries, params.clone())));
    });
}

criterion_group!(benches, bench_parser, bench_mining, bench_query);
criterion_main!(benches);
