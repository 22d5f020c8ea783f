// SPDX-License-Identifier: Apache-2.0 OR MIT
#![cfg_attr(not(feature = "telemetry"), allow(dead_code))]

#[cfg(feature = "telemetry")]
mod otel {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::OnceLock;
    use std::time::Duration;

    use opentelemetry::global;
    use opentelemetry::metrics::{Counter, Histogram};
    use opentelemetry::trace::SpanKind;
    use opentelemetry::{trace::Span as _, trace::Tracer, KeyValue};

    const METER_NAME: &str = "microtmpl_engine";
    const TRACER_NAME: &str = "microtmpl_engine";

    static ENABLED: AtomicBool = AtomicBool::new(false);
    static HANDLES: OnceLock<Handles> = OnceLock::new();

    struct Handles {
        tracer: opentelemetry::global::BoxedTracer,
        parse_hist: Histogram<f64>,
        parse_counter: Counter<u64>,
        branch_hist: Histogram<f64>,
        branch_counter: Counter<u64>,
    }

    impl Handles {
        fn new() -> Self {
            let meter = global::meter(METER_NAME);
            let parse_hist = meter
                .f64_histogram("microtmpl.parse.duration_ms")
                .with_description("Document parse duration in milliseconds")
                .init();
            let parse_counter = meter
                .u64_counter("microtmpl.parse.count")
                .with_description("Number of parsed documents")
                .init();
            let branch_hist = meter
                .f64_histogram("microtmpl.branch.duration_ms")
                .with_description("Path-covered template resolution in milliseconds")
                .init();
            let branch_counter = meter
                .u64_counter("microtmpl.branch.count")
                .with_description("Number of path-covered template lookups")
                .init();
            let tracer = global::tracer(TRACER_NAME);
            Self {
                tracer,
                parse_hist,
                parse_counter,
                branch_hist,
                branch_counter,
            }
        }
    }

    fn handles() -> &'static Handles {
        HANDLES.get_or_init(Handles::new)
    }

    pub fn enable() {
        ENABLED.store(true, Ordering::Relaxed);
    }

    pub fn disable() {
        ENABLED.store(false, Ordering::Relaxed);
    }

    fn enabled() -> bool {
        ENABLED.load(Ordering::Relaxed)
    }

    pub fn record_parse(source_len: usize, tag_count: usize, duration: Duration, success: bool) {
        if !enabled() {
            return;
        }
        let hs = handles();
        let duration_ms = duration.as_secs_f64() * 1_000.0;
        let attrs = [
            KeyValue::new("document.length", source_len as i64),
            KeyValue::new("document.tags", tag_count as i64),
            KeyValue::new("parse.success", success),
        ];
        hs.parse_counter.add(1, &attrs);
        hs.parse_hist.record(duration_ms, &attrs);
        let mut span = hs
            .tracer
            .span_builder("MicroTemplateService::new")
            .with_kind(SpanKind::Internal)
            .start(&hs.tracer);
        span.set_attribute(KeyValue::new("document.length", source_len as i64));
        span.set_attribute(KeyValue::new("document.tags", tag_count as i64));
        span.set_attribute(KeyValue::new("parse.duration_ms", duration_ms));
        span.set_attribute(KeyValue::new("parse.success", success));
        span.end();
    }

    pub fn record_branch_resolution(offset: usize, duration: Duration, reused: bool) {
        if !enabled() {
            return;
        }
        let hs = handles();
        let attrs = [
            KeyValue::new("branch.offset", offset as i64),
            KeyValue::new("branch.reused", reused),
        ];
        hs.branch_counter.add(1, &attrs);
        hs.branch_hist
            .record(duration.as_secs_f64() * 1_000.0, &attrs);
    }
}

#[cfg(not(feature = "telemetry"))]
mod otel {
    use std::time::Duration;

    pub fn enable() {}
    pub fn disable() {}
    pub fn record_parse(_source_len: usize, _tag_count: usize, _duration: Duration, _success: bool) {
    }
    pub fn record_branch_resolution(_offset: usize, _duration: Duration, _reused: bool) {}
}

pub use otel::{disable, enable, record_branch_resolution, record_parse};
