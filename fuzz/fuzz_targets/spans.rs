#![no_main]
use dienstplan::time::{CoveredUnits, FreeTime, MergeSpans, SlotWindows, TimeSpan};
use libfuzzer_sys::fuzz_target;

fn covers(spans: &[TimeSpan<u16>], unit: u16) -> bool {
    spans.iter().any(|span| span.contains(unit))
}

fn well_formed(spans: &[TimeSpan<u16>]) -> bool {
    spans.iter().all(|span| span.start() <= span.end())
        && spans
            .windows(2)
            .all(|pair| pair[0].end() + 1 < pair[1].start())
}

fuzz_target!(|data: (Vec<TimeSpan<u8>>, Vec<TimeSpan<u8>>, u8)| {
    let (declared_raw, reserved_raw, duration) = data;

    let widen = |span: &TimeSpan<u8>| TimeSpan::new(u16::from(span.start()), u16::from(span.end()));
    let declared: Vec<TimeSpan<u16>> = declared_raw.iter().map(widen).collect();
    let reserved: Vec<TimeSpan<u16>> = reserved_raw.iter().map(widen).collect();

    let merged = declared.iter().merge_spans();
    assert!(
        well_formed(&merged),
        "merge_spans must yield sorted spans with gaps between them"
    );
    for unit in 0..=255u16 {
        assert_eq!(
            covers(&merged, unit),
            covers(&declared, unit),
            "merge_spans changed coverage of unit {}",
            unit
        );
    }

    let distinct = (0..=255u16).filter(|&unit| covers(&declared, unit)).count();
    assert_eq!(
        declared.iter().covered_units(),
        distinct as u16,
        "covered_units must count each unit once"
    );

    let free = reserved.iter().free_within(&declared);
    assert!(
        well_formed(&free),
        "free_within must yield sorted spans with gaps between them"
    );
    for unit in 0..=255u16 {
        assert_eq!(
            covers(&free, unit),
            covers(&declared, unit) && !covers(&reserved, unit),
            "unit {} must be free exactly when declared and not reserved",
            unit
        );
    }

    let duration = u16::from(duration);
    let windows = free.iter().slot_windows(duration);
    if duration == 0 {
        assert!(windows.is_empty(), "zero-length windows must not exist");
    } else {
        assert!(
            windows.iter().all(|window| window.units() == duration),
            "every window must have the requested length"
        );
        assert!(
            windows.iter().all(|window| {
                free.iter()
                    .any(|span| span.start() <= window.start() && window.end() <= span.end())
            }),
            "every window must lie inside a free span"
        );
    }
});
