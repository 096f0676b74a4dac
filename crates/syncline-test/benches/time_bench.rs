//! Benchmarks for Syncline timestamping and offset collection

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use syncline_core::{RawEvent, ReferenceTime, StreamInfo, StreamName, TimelinePosition};
use syncline_test::{ClockDriftModel, SimulatedStream};
use syncline_time::{ClockSource, EventTimestamper, ManualClock, OffsetModel, OffsetSampleCollector};

fn bench_event_stamp(c: &mut Criterion) {
    let clock: Arc<dyn ClockSource> = Arc::new(ManualClock::new(100.0));
    let stamper = EventTimestamper::new(clock);

    c.bench_function("event_stamp", |b| {
        b.iter(|| {
            let raw = RawEvent::new("button_click").with_field("id", "next");
            black_box(stamper.stamp(black_box(raw)))
        })
    });
}

fn bench_bridge_message_parse(c: &mut Criterion) {
    let msg = r#"{"type":"button_click","data":{"id":"next","x":120,"y":48}}"#;

    c.bench_function("bridge_message_parse", |b| {
        b.iter(|| RawEvent::from_bridge_message(black_box(msg)))
    });
}

fn bench_collector_record_sample(c: &mut Criterion) {
    let clock = Arc::new(ManualClock::new(0.0));
    let mut collector = OffsetSampleCollector::start_now(clock.clone());
    let mut stream = SimulatedStream::new(
        StreamInfo::new("EEG", "EEG", 8),
        clock.clone(),
        ClockDriftModel::fast(),
        250.0,
        42,
    );

    c.bench_function("collector_record_sample", |b| {
        b.iter(|| {
            clock.advance(0.004);
            black_box(collector.record_sample(&mut stream))
        })
    });
}

fn bench_offset_model_record(c: &mut Criterion) {
    let mut model = OffsetModel::new();
    let stream = StreamName::from("EEG");

    c.bench_function("offset_model_record", |b| {
        let mut i = 0u32;
        b.iter(|| {
            i = i.wrapping_add(1);
            model.record(
                black_box(&stream),
                black_box(ReferenceTime(i as f64 * 0.02)),
                black_box(-0.05 + (i % 7) as f64 * 1e-4),
            );
        })
    });
}

fn bench_timeline_classify(c: &mut Criterion) {
    c.bench_function("timeline_classify", |b| {
        b.iter(|| TimelinePosition::classify(black_box(-1.8)))
    });
}

criterion_group!(
    benches,
    bench_event_stamp,
    bench_bridge_message_parse,
    bench_collector_record_sample,
    bench_offset_model_record,
    bench_timeline_classify,
);
criterion_main!(benches);
