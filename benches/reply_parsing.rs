//! Benchmarks for chat reply repair
//!
//! Run with: cargo bench
//! Or for specific benchmarks: cargo bench -- <filter>

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::time::Duration;

use festival_concierge::core::chat::{PlainTextRenderer, parse_follow_ups, parse_reply};
use festival_concierge::core::language::Language;

fn parking_reply() -> String {
    let lots: Vec<String> = (0..8)
        .map(|i| {
            format!(
                r#"{{"name":"Lot {i}","address":"Janggok-dong {i}","capacity":"{}","fee":"Free"}}"#,
                100 + i * 50
            )
        })
        .collect();
    format!(
        r#"{{"summary":"There are several free lots near the park.","cards":[{{"title":"Parking","type":"parking","data":{{"overview":"Temporary lots open on weekends","lots":[{}]}}}},{{"title":"Schedule","type":"table","data":{{"headers":["Time","Event"],"rows":[["10:00","Opening"],["14:00","Busking"],[19,"Night show"]]}}}}]}}"#,
        lots.join(",")
    )
}

/// Benchmark the parse, salvage and fallback paths
fn bench_reply_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("reply_repair");
    group.measurement_time(Duration::from_secs(5));

    let exact = parking_reply();
    let fenced = format!("```json\n{exact}\n```");
    let prose_wrapped = format!("Here is the answer you asked for:\n{exact}\nHope that helps!");
    let truncated = exact[..exact.len() / 2].to_string();
    let garbage = "I could not find anything about that, sorry.".repeat(20);

    let inputs = [
        ("exact", exact.as_str()),
        ("fenced", fenced.as_str()),
        ("prose_wrapped", prose_wrapped.as_str()),
        ("summary_salvage", truncated.as_str()),
        ("apology_fallback", garbage.as_str()),
    ];

    for (name, raw) in inputs {
        group.throughput(Throughput::Bytes(raw.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_reply", name), raw, |b, raw| {
            b.iter(|| parse_reply(black_box(raw), Language::En))
        });
    }

    group.finish();
}

/// Benchmark follow-up suggestion parsing
fn bench_follow_ups(c: &mut Criterion) {
    let mut group = c.benchmark_group("follow_ups");

    let clean = r#"{"label":"AI suggested questions","questions":["Is there a shuttle?","Where can I eat?","Is it free?","Extra one"]}"#;
    let noisy = r#"```json
{"questions":["Is there a shuttle?", 42, "", null, "Where can I eat?"]}
```"#;

    group.bench_function("clean", |b| {
        b.iter(|| parse_follow_ups(black_box(clean), Language::Ko))
    });
    group.bench_function("noisy", |b| {
        b.iter(|| parse_follow_ups(black_box(noisy), Language::Ko))
    });

    group.finish();
}

/// Benchmark plain-text rendering of a parsed reply
fn bench_render(c: &mut Criterion) {
    let reply = parse_reply(&parking_reply(), Language::En).reply;

    c.bench_function("render_plain_text", |b| {
        b.iter(|| PlainTextRenderer.render_reply(black_box(&reply.summary), black_box(&reply.cards)))
    });
}

criterion_group!(benches, bench_reply_repair, bench_follow_ups, bench_render);
criterion_main!(benches);
