use itertools::Itertools;
use num::{Integer, One, Zero};
use serde::{Deserialize, Serialize};

/// Number of minutes in a venue day. Spans over `u16` follow the crate-wide
/// convention of minutes since midnight, `0..=1439`.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Inclusive `[start, end]` span of discrete time units.
/// `<N>`: any integer type
///
/// Spans are ordered by `(start, end)`, so a sorted sequence groups
/// overlapping spans next to each other.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSpan<N>(pub N, pub N)
where
    N: Integer + Copy;

#[cfg(feature = "arbitrary")]
impl<'a, N> arbitrary::Arbitrary<'a> for TimeSpan<N>
where
    N: Integer + Copy + arbitrary::Arbitrary<'a>,
{
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let a = N::arbitrary(u)?;
        let b = N::arbitrary(u)?;
        Ok(TimeSpan::new(a, b))
    }
}

impl<N> TimeSpan<N>
where
    N: Integer + Copy,
{
    /// Constructs a new span, swapping the bounds when they arrive reversed.
    ///
    /// # Examples
    /// ```
    /// use dienstplan::time::TimeSpan;
    ///
    /// let span = TimeSpan::new(90, 30);
    ///
    /// assert_eq!(span.start(), 30);
    /// assert_eq!(span.end(), 90);
    /// ```
    pub fn new(start: N, end: N) -> TimeSpan<N> {
        if start > end {
            TimeSpan(end, start)
        } else {
            TimeSpan(start, end)
        }
    }

    /// Convenience accessor for the first covered unit.
    pub fn start(self) -> N {
        self.0
    }

    /// Convenience accessor for the last covered unit.
    pub fn end(self) -> N {
        self.1
    }

    /// Number of units covered by this span. Both ends are inclusive, so a
    /// span of one unit has a count of one.
    ///
    /// # Examples
    /// ```
    /// use dienstplan::time::TimeSpan;
    ///
    /// // 10:00 through 10:59, in minutes
    /// assert_eq!(TimeSpan::new(600, 659).units(), 60);
    /// assert_eq!(TimeSpan::new(0, 0).units(), 1);
    /// ```
    pub fn units(self) -> N {
        <N>::one() + (self.1 - self.0)
    }

    /// Whether `unit` falls inside this span.
    pub fn contains(self, unit: N) -> bool {
        self.0 <= unit && unit <= self.1
    }

    /// Whether two spans share at least one unit.
    ///
    /// # Examples
    /// ```
    /// use dienstplan::time::TimeSpan;
    ///
    /// let morning = TimeSpan::new(600, 719);
    ///
    /// assert!(morning.overlaps(TimeSpan::new(700, 779)));
    /// assert!(!morning.overlaps(TimeSpan::new(720, 779)));
    /// ```
    pub fn overlaps(self, other: TimeSpan<N>) -> bool {
        self.0 <= other.1 && other.0 <= self.1
    }

    /// The units covered by both spans, if any.
    ///
    /// # Examples
    /// ```
    /// use dienstplan::time::TimeSpan;
    ///
    /// let a = TimeSpan::new(600, 719);
    /// let b = TimeSpan::new(660, 779);
    ///
    /// assert_eq!(a.intersect(b), Some(TimeSpan::new(660, 719)));
    /// assert_eq!(a.intersect(TimeSpan::new(720, 779)), None);
    /// ```
    pub fn intersect(self, other: TimeSpan<N>) -> Option<TimeSpan<N>> {
        if self.overlaps(other) {
            Some(TimeSpan(self.0.max(other.0), self.1.min(other.1)))
        } else {
            None
        }
    }
}

pub trait MergeSpans<N>
where
    N: Integer + Copy,
{
    fn merge_spans(self) -> Vec<TimeSpan<N>>;
}

impl<'a, T, N> MergeSpans<N> for T
where
    T: Iterator<Item = &'a TimeSpan<N>>,
    N: 'a + Integer + One + Copy,
{
    /// Merges overlapping and adjacent spans into a minimal sorted set.
    /// Adjacency counts: `[600, 659]` and `[660, 719]` become `[600, 719]`.
    ///
    /// # Examples
    /// ```
    /// use dienstplan::time::{MergeSpans, TimeSpan};
    ///
    /// let declared = vec![
    ///     TimeSpan::new(900, 959),
    ///     TimeSpan::new(600, 659),
    ///     TimeSpan::new(660, 719),
    ///     TimeSpan::new(930, 989),
    /// ];
    ///
    /// assert_eq!(
    ///     declared.iter().merge_spans(),
    ///     vec![TimeSpan::new(600, 719), TimeSpan::new(900, 989)]
    /// );
    /// ```
    fn merge_spans(self) -> Vec<TimeSpan<N>> {
        let sorted = self.copied().sorted_unstable();

        let mut merged: Vec<TimeSpan<N>> = Vec::with_capacity(sorted.len());

        for span in sorted {
            match merged.last_mut() {
                // Sorted input guarantees span.start() >= last.start(), so the
                // subtraction in the adjacency test cannot underflow.
                Some(last)
                    if span.start() <= last.end()
                        || span.start() - last.end() == <N>::one() =>
                {
                    if span.end() > last.end() {
                        last.1 = span.end();
                    }
                }
                _ => merged.push(span),
            }
        }

        merged
    }
}

pub trait FreeTime<N>
where
    N: Integer + Copy,
{
    fn free_within(self, declared: &[TimeSpan<N>]) -> Vec<TimeSpan<N>>;
}

impl<'a, T, N> FreeTime<N> for T
where
    T: Iterator<Item = &'a TimeSpan<N>>,
    N: 'a + Integer + One + Copy,
{
    /// Subtracts the iterated (reserved) spans from `declared`, yielding what
    /// remains free. Both sides are coalesced first, so neither needs to be
    /// sorted or disjoint.
    ///
    /// # Examples
    /// ```
    /// use dienstplan::time::{FreeTime, TimeSpan};
    ///
    /// // Declared 10:00-17:00, one booking 12:00-14:00.
    /// let declared = vec![TimeSpan::new(600u16, 1019)];
    /// let reserved = vec![TimeSpan::new(720, 839)];
    ///
    /// assert_eq!(
    ///     reserved.iter().free_within(&declared),
    ///     vec![TimeSpan::new(600, 719), TimeSpan::new(840, 1019)]
    /// );
    /// ```
    fn free_within(self, declared: &[TimeSpan<N>]) -> Vec<TimeSpan<N>> {
        let reserved = self.merge_spans();
        let declared = declared.iter().merge_spans();

        let mut free = Vec::with_capacity(declared.len() + reserved.len());
        let mut blocks = reserved.iter().copied().peekable();

        for span in declared {
            let mut cursor = span.start();
            let mut open = true;

            while let Some(&block) = blocks.peek() {
                if block.end() < cursor {
                    blocks.next();
                    continue;
                }
                if block.start() > span.end() {
                    break;
                }
                if block.start() > cursor {
                    free.push(TimeSpan(cursor, block.start() - <N>::one()));
                }
                if block.end() >= span.end() {
                    // The block runs past this span; keep it around, it may
                    // clip the next declared span as well.
                    open = false;
                    break;
                }
                cursor = block.end() + <N>::one();
                blocks.next();
            }

            if open && cursor <= span.end() {
                free.push(TimeSpan(cursor, span.end()));
            }
        }

        free
    }
}

pub trait SlotWindows<N>
where
    N: Integer + Copy,
{
    fn slot_windows(self, len: N) -> Vec<TimeSpan<N>>;
}

impl<'a, T, N> SlotWindows<N> for T
where
    T: Iterator<Item = &'a TimeSpan<N>>,
    N: 'a + Integer + One + Zero + Copy,
{
    /// Enumerates every window of exactly `len` units inside each span.
    /// Candidate slot starts for a booking of a given duration.
    ///
    /// # Examples
    /// ```
    /// use dienstplan::time::{SlotWindows, TimeSpan};
    ///
    /// let free = vec![TimeSpan::new(0u16, 4)];
    ///
    /// assert_eq!(
    ///     free.iter().slot_windows(3),
    ///     vec![
    ///         TimeSpan::new(0, 2),
    ///         TimeSpan::new(1, 3),
    ///         TimeSpan::new(2, 4),
    ///     ]
    /// );
    /// assert!(free.iter().slot_windows(6).is_empty());
    /// ```
    fn slot_windows(self, len: N) -> Vec<TimeSpan<N>> {
        if len.is_zero() {
            return vec![];
        }

        let reach = len - <N>::one();
        let mut windows = Vec::with_capacity(self.size_hint().1.unwrap_or(0));

        for span in self {
            let mut start = span.start();

            while start + reach <= span.end() {
                windows.push(TimeSpan(start, start + reach));
                start = start + <N>::one();
            }
        }

        windows
    }
}

pub trait CoveredUnits<N>
where
    N: Integer + Copy,
{
    fn covered_units(self) -> N;
}

impl<'a, T, N> CoveredUnits<N> for T
where
    T: Iterator<Item = &'a TimeSpan<N>>,
    N: 'a + Integer + One + Zero + Copy,
{
    /// Total number of distinct units covered. Overlaps are collapsed before
    /// counting, so double-declared time is not counted twice.
    ///
    /// # Examples
    /// ```
    /// use dienstplan::time::{CoveredUnits, TimeSpan};
    ///
    /// let spans = vec![
    ///     TimeSpan::new(0u16, 9),
    ///     TimeSpan::new(5, 14),
    ///     TimeSpan::new(20, 20),
    /// ];
    ///
    /// assert_eq!(spans.iter().covered_units(), 16);
    /// ```
    fn covered_units(self) -> N {
        self.merge_spans()
            .iter()
            .fold(<N>::zero(), |total, span| total + span.units())
    }
}
