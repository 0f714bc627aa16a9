//! Performance benchmarks for SSE decoding
//!
//! Measures decode throughput for streamed answers at different chunk sizes.
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use poe_bot::models::PartialResponse;
use poe_bot::sse::{ParsedEvent, ServerEvent, SseDecoder};

/// Generate an encoded answer of `frames` text frames followed by done
fn generate_transcript(frames: usize) -> String {
    let mut transcript: String = (0..frames)
        .map(|i| {
            let text = format!(" token {} with {{braces}} and \\\"quotes\\\"", i);
            ServerEvent::Text(PartialResponse::text(text))
                .encode()
                .unwrap_or_default()
        })
        .collect();
    transcript.push_str("event: done\ndata: {}\n\n");
    transcript
}

/// Split an ASCII transcript into chunks of `size` bytes
fn chunk(transcript: &str, size: usize) -> Vec<String> {
    transcript
        .as_bytes()
        .chunks(size)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect()
}

fn decode_all(chunks: &[String]) -> usize {
    let mut decoder = SseDecoder::new();
    let mut count = 0;
    for chunk in chunks {
        decoder.push(chunk);
        while let Ok(Some(event)) = decoder.next_event() {
            if event == ParsedEvent::Done {
                return count;
            }
            count += 1;
        }
    }
    count
}

/// Benchmark decoding with network-sized chunks
fn bench_decode_chunk_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_chunk_sizes");
    let transcript = generate_transcript(200);

    for size in [16, 64, 512, 4096].iter() {
        let chunks = chunk(&transcript, *size);
        group.throughput(Throughput::Bytes(transcript.len() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_bytes", size)),
            &chunks,
            |b, chunks| {
                b.iter(|| black_box(decode_all(black_box(chunks))));
            },
        );
    }

    group.finish();
}

/// Benchmark decoding a whole answer delivered at once
fn bench_decode_answer_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_answer_length");

    for frames in [10, 100, 1000].iter() {
        let chunks = vec![generate_transcript(*frames)];
        group.throughput(Throughput::Bytes(chunks[0].len() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_frames", frames)),
            &chunks,
            |b, chunks| {
                b.iter(|| black_box(decode_all(black_box(chunks))));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_decode_chunk_sizes, bench_decode_answer_length);

criterion_main!(benches);
