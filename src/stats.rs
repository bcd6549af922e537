use crate::error::FetchError;
use crate::model::TrackRecord;
use std::cmp::Ordering;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3_600;

/// Whole hours, minutes and seconds of a listening total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeBreakdown {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeBreakdown {
    /// Minutes come from the remainder after whole hours, so both `minutes` and
    /// `seconds` stay within `0..60`.
    pub fn from_seconds(total_seconds: u64) -> Self {
        Self {
            hours: total_seconds / SECONDS_PER_HOUR,
            minutes: (total_seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            seconds: total_seconds % SECONDS_PER_MINUTE,
        }
    }

    pub fn total_seconds(self) -> u64 {
        self.hours
            .saturating_mul(SECONDS_PER_HOUR)
            .saturating_add(self.minutes * SECONDS_PER_MINUTE)
            .saturating_add(self.seconds)
    }
}

impl fmt::Display for TimeBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hours, {} minutes, {} seconds",
            self.hours, self.minutes, self.seconds
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregateSummary {
    pub total_tracks: u64,
    pub total_listens: u64,
    pub total_seconds: u64,
}

impl AggregateSummary {
    pub fn time(&self) -> TimeBreakdown {
        TimeBreakdown::from_seconds(self.total_seconds)
    }
}

pub fn summarize(records: &[TrackRecord]) -> AggregateSummary {
    records
        .iter()
        .fold(AggregateSummary::default(), |mut summary, record| {
            summary.total_tracks = summary.total_tracks.saturating_add(1);
            summary.total_listens = summary.total_listens.saturating_add(record.listen_count);
            summary.total_seconds = summary
                .total_seconds
                .saturating_add(record.time_listened_seconds);
            summary
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    #[default]
    ListenCount,
    TimeListened,
    Title,
}

impl SortOption {
    pub const ALL: [Self; 3] = [Self::ListenCount, Self::TimeListened, Self::Title];

    pub fn label(self) -> &'static str {
        match self {
            Self::ListenCount => "listen count",
            Self::TimeListened => "time listened",
            Self::Title => "title",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::ListenCount => Self::TimeListened,
            Self::TimeListened => Self::Title,
            Self::Title => Self::ListenCount,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "listens" | "count" | "listen-count" | "plays" => Some(Self::ListenCount),
            "time" | "listened" | "time-listened" | "seconds" => Some(Self::TimeListened),
            "title" | "name" => Some(Self::Title),
            _ => None,
        }
    }
}

/// Numeric keys sort highest first, titles alphabetically; equal keys fall back to
/// ascending id so the order is reproducible.
pub fn compare_records(a: &TrackRecord, b: &TrackRecord, sort: SortOption) -> Ordering {
    let primary = match sort {
        SortOption::ListenCount => b.listen_count.cmp(&a.listen_count),
        SortOption::TimeListened => b.time_listened_seconds.cmp(&a.time_listened_seconds),
        SortOption::Title => title_key(&a.title).cmp(&title_key(&b.title)),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

fn title_key(title: &str) -> String {
    title
        .nfkd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Indices into `records` in display order. The slice itself is left untouched.
pub fn sorted_view(records: &[TrackRecord], sort: SortOption) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| compare_records(&records[a], &records[b], sort));
    order
}

/// A fetched month of listens with its derived ordering and totals.
#[derive(Debug, Clone)]
pub struct ListenData {
    records: Vec<TrackRecord>,
    sort: SortOption,
    view: Vec<usize>,
    summary: AggregateSummary,
}

impl ListenData {
    pub fn new(records: Vec<TrackRecord>) -> Self {
        let sort = SortOption::default();
        let view = sorted_view(&records, sort);
        let summary = summarize(&records);
        Self {
            records,
            sort,
            view,
            summary,
        }
    }

    /// Records in the order they arrived.
    pub fn records(&self) -> &[TrackRecord] {
        &self.records
    }

    pub fn sort(&self) -> SortOption {
        self.sort
    }

    pub fn summary(&self) -> AggregateSummary {
        self.summary
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn sorted(&self) -> impl Iterator<Item = &TrackRecord> + '_ {
        self.view.iter().map(|&index| &self.records[index])
    }

    pub fn get_sorted(&self, position: usize) -> Option<&TrackRecord> {
        self.view.get(position).map(|&index| &self.records[index])
    }

    fn resort(&mut self, sort: SortOption) {
        self.sort = sort;
        self.view = sorted_view(&self.records, sort);
    }
}

#[derive(Debug, Clone)]
pub enum ListenPhase {
    Idle,
    Loading,
    Ready(ListenData),
    Error(String),
}

/// Per-page holder of the fetched collection and the active sort option.
#[derive(Debug, Clone)]
pub struct ListenDataStore {
    phase: ListenPhase,
}

impl Default for ListenDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenDataStore {
    pub fn new() -> Self {
        Self {
            phase: ListenPhase::Idle,
        }
    }

    pub fn phase(&self) -> &ListenPhase {
        &self.phase
    }

    /// Marks the single fetch of this page as in flight. Returns `false` when a
    /// fetch was already issued.
    pub fn begin_fetch(&mut self) -> bool {
        if !matches!(self.phase, ListenPhase::Idle) {
            return false;
        }
        self.phase = ListenPhase::Loading;
        true
    }

    /// Applies the fetch outcome. Ignored unless a fetch is in flight.
    pub fn resolve(&mut self, result: Result<Vec<TrackRecord>, FetchError>) -> bool {
        if !matches!(self.phase, ListenPhase::Loading) {
            return false;
        }
        self.phase = match result {
            Ok(records) => ListenPhase::Ready(ListenData::new(records)),
            Err(err) => ListenPhase::Error(err.user_message()),
        };
        true
    }

    pub fn change_sort(&mut self, sort: SortOption) -> bool {
        let ListenPhase::Ready(data) = &mut self.phase else {
            return false;
        };
        if data.sort != sort {
            data.resort(sort);
        }
        true
    }

    pub fn data(&self) -> Option<&ListenData> {
        match &self.phase {
            ListenPhase::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<AggregateSummary> {
        self.data().map(ListenData::summary)
    }

    pub fn sort(&self) -> SortOption {
        self.data().map(ListenData::sort).unwrap_or_default()
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            ListenPhase::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, ListenPhase::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrackId;
    use proptest::prelude::*;

    fn record(id: u64, title: &str, listen_count: u64, seconds: u64) -> TrackRecord {
        TrackRecord {
            id: TrackId::Numeric(id),
            album_art_url: String::new(),
            title: title.to_string(),
            listen_count,
            time_listened_seconds: seconds,
        }
    }

    fn ids(data: &ListenData) -> Vec<TrackId> {
        data.sorted().map(|record| record.id.clone()).collect()
    }

    #[test]
    fn breakdown_splits_hours_minutes_seconds() {
        assert_eq!(
            TimeBreakdown::from_seconds(3_725),
            TimeBreakdown {
                hours: 1,
                minutes: 2,
                seconds: 5
            }
        );
        assert_eq!(TimeBreakdown::from_seconds(0), TimeBreakdown::default());
        assert_eq!(
            TimeBreakdown::from_seconds(59).to_string(),
            "0 hours, 0 minutes, 59 seconds"
        );
    }

    #[test]
    fn minutes_ignore_whole_hours() {
        let breakdown = TimeBreakdown::from_seconds(7_260);
        assert_eq!(breakdown.hours, 2);
        assert_eq!(breakdown.minutes, 1);
        assert_eq!(breakdown.seconds, 0);
    }

    #[test]
    fn empty_collection_summarizes_to_zero() {
        assert_eq!(summarize(&[]), AggregateSummary::default());
    }

    #[test]
    fn summary_counts_zero_listen_records() {
        let summary = summarize(&[record(1, "a", 0, 0), record(2, "b", 3, 95)]);
        assert_eq!(summary.total_tracks, 2);
        assert_eq!(summary.total_listens, 3);
        assert_eq!(summary.total_seconds, 95);
    }

    #[test]
    fn listen_count_sort_breaks_ties_by_id() {
        let data = ListenData::new(vec![
            record(1, "a", 5, 10),
            record(2, "b", 9, 10),
            record(3, "c", 5, 10),
        ]);
        assert_eq!(
            ids(&data),
            vec![TrackId::Numeric(2), TrackId::Numeric(1), TrackId::Numeric(3)]
        );
    }

    #[test]
    fn time_sort_is_descending() {
        let records = vec![record(1, "a", 1, 30), record(2, "b", 1, 300), record(3, "c", 1, 3)];
        assert_eq!(sorted_view(&records, SortOption::TimeListened), vec![1, 0, 2]);
    }

    #[test]
    fn title_sort_ignores_case_and_accents() {
        let records = vec![
            record(1, "zebra", 1, 1),
            record(2, "Émile", 1, 1),
            record(3, "apple", 1, 1),
            record(4, "Apple", 1, 1),
        ];
        assert_eq!(sorted_view(&records, SortOption::Title), vec![2, 3, 1, 0]);
    }

    #[test]
    fn accented_title_sorts_beside_its_plain_form() {
        let records = vec![
            record(1, "Ezra", 1, 1),
            record(2, "Émile", 1, 1),
            record(3, "Emile", 1, 1),
            record(4, "Ebony", 1, 1),
        ];
        assert_eq!(sorted_view(&records, SortOption::Title), vec![3, 1, 2, 0]);
    }

    #[test]
    fn store_walks_idle_loading_ready() {
        let mut store = ListenDataStore::new();
        assert!(store.summary().is_none());
        assert!(store.begin_fetch());
        assert!(store.is_loading());
        assert!(!store.begin_fetch());

        assert!(store.resolve(Ok(vec![record(1, "a", 2, 61)])));
        let summary = store.summary().expect("ready");
        assert_eq!(summary.total_listens, 2);
        assert_eq!(store.sort(), SortOption::ListenCount);
    }

    #[test]
    fn resolve_without_fetch_is_ignored() {
        let mut store = ListenDataStore::new();
        assert!(!store.resolve(Ok(Vec::new())));
        assert!(matches!(store.phase(), ListenPhase::Idle));
    }

    #[test]
    fn failure_is_terminal_and_hides_numbers() {
        let mut store = ListenDataStore::new();
        store.begin_fetch();
        store.resolve(Err(FetchError::Status(502)));

        assert!(store.error().is_some());
        assert!(store.summary().is_none());
        assert!(!store.change_sort(SortOption::Title));
        assert!(!store.begin_fetch());
        assert!(!store.resolve(Ok(vec![record(1, "a", 1, 1)])));
        assert!(store.error().is_some());
    }

    #[test]
    fn changing_sort_keeps_totals_and_raw_order() {
        let mut store = ListenDataStore::new();
        store.begin_fetch();
        store.resolve(Ok(vec![
            record(1, "b", 1, 500),
            record(2, "a", 7, 20),
        ]));
        let before = store.summary();

        assert!(store.change_sort(SortOption::TimeListened));
        let data = store.data().expect("ready");
        assert_eq!(data.sort(), SortOption::TimeListened);
        assert_eq!(ids(data), vec![TrackId::Numeric(1), TrackId::Numeric(2)]);
        assert_eq!(data.records()[0].id, TrackId::Numeric(1));
        assert_eq!(store.summary(), before);

        store.change_sort(SortOption::ListenCount);
        assert_eq!(
            store.data().and_then(|data| data.get_sorted(0)).map(|r| r.id.clone()),
            Some(TrackId::Numeric(2))
        );
    }

    #[test]
    fn sort_option_parse_and_cycle() {
        assert_eq!(SortOption::parse("TIME"), Some(SortOption::TimeListened));
        assert_eq!(SortOption::parse("listens"), Some(SortOption::ListenCount));
        assert_eq!(SortOption::parse("rating"), None);
        let mut option = SortOption::default();
        for _ in 0..SortOption::ALL.len() {
            option = option.next();
        }
        assert_eq!(option, SortOption::default());
    }

    fn arb_records() -> impl Strategy<Value = Vec<TrackRecord>> {
        proptest::collection::vec((0u64..1_000, 0u64..100_000, "[a-zA-Z ]{0,8}"), 0..40).prop_map(
            |rows| {
                rows.into_iter()
                    .enumerate()
                    .map(|(id, (listens, seconds, title))| {
                        record(id as u64, &title, listens, seconds)
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn breakdown_recomposes(total in 0u64..10_000_000) {
            let breakdown = TimeBreakdown::from_seconds(total);
            prop_assert_eq!(breakdown.total_seconds(), total);
            prop_assert!(breakdown.minutes < 60);
            prop_assert!(breakdown.seconds < 60);
        }

        #[test]
        fn totals_ignore_order(records in arb_records(), sort_index in 0usize..3) {
            let sort = SortOption::ALL[sort_index];
            let permuted: Vec<TrackRecord> = sorted_view(&records, sort)
                .into_iter()
                .map(|index| records[index].clone())
                .collect();
            prop_assert_eq!(summarize(&records), summarize(&permuted));
        }

        #[test]
        fn sorted_view_is_a_deterministic_permutation(
            records in arb_records(),
            sort_index in 0usize..3,
        ) {
            let sort = SortOption::ALL[sort_index];
            let view = sorted_view(&records, sort);
            let mut seen = view.clone();
            seen.sort_unstable();
            prop_assert_eq!(seen, (0..records.len()).collect::<Vec<_>>());

            let mut reversed = records.clone();
            reversed.reverse();
            let from_reversed: Vec<TrackId> = sorted_view(&reversed, sort)
                .into_iter()
                .map(|index| reversed[index].id.clone())
                .collect();
            let from_given: Vec<TrackId> = view
                .into_iter()
                .map(|index| records[index].id.clone())
                .collect();
            prop_assert_eq!(from_given, from_reversed);
        }
    }
}
