#![no_main]

use hitload::metrics::LatencyHistogram;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&sigfig, rest)) = data.split_first() else {
        return;
    };
    let Ok(mut histogram) = LatencyHistogram::new(sigfig % 6) else {
        return;
    };
    for chunk in rest.chunks(8).take(1024) {
        let mut bytes = [0u8; 8];
        for (slot, byte) in bytes.iter_mut().zip(chunk) {
            *slot = *byte;
        }
        histogram.record(u64::from_le_bytes(bytes));
    }
    let summary = histogram.summary();
    debug_assert!(summary.min <= summary.max);
    debug_assert!(summary.p50 <= summary.p99);
});
