#![no_main]
use chrono::{Duration, NaiveDate};
use dienstplan::suggest::{suggest_slots, SlotRequest, SuggestConfig};
use dienstplan::time::TimeSpan;
use libfuzzer_sys::fuzz_target;
use std::collections::BTreeMap;

fuzz_target!(|data: (Vec<(u8, Vec<(u8, u8)>)>, u16, u8, u8)| {
    let (days, duration_seed, preferred_seed, step_seed) = data;

    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut free_by_day: BTreeMap<NaiveDate, Vec<TimeSpan<u16>>> = BTreeMap::new();
    for (offset, raw) in days {
        let date = base + Duration::days(i64::from(offset));
        let spans = raw
            .iter()
            .map(|&(a, b)| TimeSpan::new(u16::from(a) * 5, u16::from(b) * 5 + 4));
        free_by_day.entry(date).or_default().extend(spans);
    }

    let request = SlotRequest {
        date: base,
        duration_minutes: duration_seed % 1440 + 1,
        preferred_hour: preferred_seed % 24,
    };
    let config = SuggestConfig {
        step_minutes: u16::from(step_seed) % 60 + 1,
        day_weight: 120,
        horizon_days: 32,
        max_results: 8,
    };

    let ranked = suggest_slots(&request, &free_by_day, &config)
        .expect("a valid request over valid config must not fail");

    assert!(
        ranked.len() <= config.max_results,
        "no more than max_results suggestions may come back"
    );
    assert!(
        ranked.windows(2).all(|pair| {
            (pair[0].score, pair[0].date, pair[0].span.start())
                <= (pair[1].score, pair[1].date, pair[1].span.start())
        }),
        "suggestions must be ordered by score, then date, then start"
    );

    let preferred = u16::from(request.preferred_hour) * 60;
    for suggestion in &ranked {
        assert_eq!(
            suggestion.span.units(),
            request.duration_minutes,
            "every suggestion must run for the requested duration"
        );
        assert_eq!(
            suggestion.span.start() % config.step_minutes,
            0,
            "every suggestion must start on the step grid"
        );

        let offset = suggestion.date.signed_duration_since(request.date).num_days();
        assert!(
            (0..i64::from(config.horizon_days)).contains(&offset),
            "suggestion on {} falls outside the horizon",
            suggestion.date
        );

        let free = free_by_day
            .get(&suggestion.date)
            .expect("suggestions must only use days with free time");
        assert!(
            free.iter().any(|span| {
                span.start() <= suggestion.span.start() && suggestion.span.end() <= span.end()
            }),
            "suggested span {:?} must lie inside a free span",
            suggestion.span
        );

        let expected = u32::from(suggestion.span.start().abs_diff(preferred))
            + offset as u32 * config.day_weight;
        assert_eq!(
            suggestion.score, expected,
            "score must be minutes from the preferred start plus the day weight"
        );
    }
});
