use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use session_feed::transcript::parse_content;

/// A session log mixing every entry shape the parser classifies, plus the
/// noise it skips.
fn synthetic_log(turns: usize) -> String {
    let mut log = String::new();
    for i in 0..turns {
        let ts = format!("2025-01-01T00:{:02}:{:02}.000Z", (i / 60) % 60, i % 60);
        let lines = [
            json!({"type": "user", "message": {"role": "user", "content": format!("request {i}")}, "timestamp": ts}),
            json!({"type": "assistant", "timestamp": ts, "message": {"role": "assistant", "content": [
                {"type": "thinking", "thinking": "planning the change"},
                {"type": "text", "text": "Editing the handler."},
                {"type": "tool_use", "name": "Edit", "input": {
                    "file_path": format!("src/handlers/h{i}.rs"),
                    "old_string": "fn a() {}\n",
                    "new_string": "fn a() {}\nfn b() {}\n"
                }},
                {"type": "tool_use", "name": "Bash", "input": {"command": "cargo test --workspace --all-features -- --nocapture"}}
            ]}}),
            json!({"type": "user", "message": {"role": "user", "content": [
                {"type": "tool_result", "tool_use_id": "t", "content": "ok"}
            ]}, "timestamp": ts}),
            json!({"type": "progress", "data": {"step": i}}),
        ];
        for line in lines {
            log.push_str(&line.to_string());
            log.push('\n');
        }
        log.push_str("{\"type\":\"assistant\",\"mess\n");
    }
    log
}

fn bench_parse_content(c: &mut Criterion) {
    let log = synthetic_log(2_000);
    let midpoint = (log.len() / 2) as u64;
    let tail = &log[log.len() / 2..];

    c.bench_function("parse_content full log", |b| {
        b.iter(|| parse_content(black_box(&log), 0))
    });
    c.bench_function("parse_content resumed tail", |b| {
        b.iter(|| parse_content(black_box(tail), midpoint))
    });
}

criterion_group!(benches, bench_parse_content);
criterion_main!(benches);
