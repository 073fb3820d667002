//! Message catalog and scheduler
//!
//! Decides when the companion may speak and what it says. Contextual
//! weighting triples the representation of phrases tagged for the current
//! time-of-day and day-of-week, mixes in the always-eligible symbol/badge
//! entries once, and a fixed-fraction sample of the remaining plain phrases
//! once, then draws uniformly over that pool.

use rand::Rng;
use rand::seq::{IndexedRandom, IteratorRandom};
use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Fraction of plain (non-contextual) phrases sampled into the weighted pool.
const SAMPLE_FRACTION: f32 = 0.25;
/// How many times each matching contextual entry is represented.
const CONTEXT_WEIGHT: usize = 3;

/// What the overlay renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Single decorative glyph (heart, sparkle, ...)
    Symbol,
    /// Short text phrase
    Phrase,
    /// Small achievement-style token
    Badge,
}

/// Immutable message value produced by the scheduler (or forced by an
/// external collaborator) and consumed for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
    /// Optional accessible label for assistive text
    pub label: Option<String>,
}

impl Message {
    pub fn phrase(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Phrase,
            text: text.into(),
            label: None,
        }
    }
}

/// Time-of-day context tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeTag {
    Morning,
    Afternoon,
    Evening,
    LateNight,
}

impl TimeTag {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeTag::Morning,
            12..=16 => TimeTag::Afternoon,
            17..=21 => TimeTag::Evening,
            _ => TimeTag::LateNight,
        }
    }
}

/// Day-of-week context tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayTag {
    Monday,
    Friday,
    Weekend,
    Workday,
}

impl DayTag {
    /// `weekday` follows the JS `getDay()` convention: 0 = Sunday.
    pub fn from_weekday(weekday: u32) -> Self {
        match weekday {
            0 | 6 => DayTag::Weekend,
            1 => DayTag::Monday,
            5 => DayTag::Friday,
            _ => DayTag::Workday,
        }
    }
}

/// Context a catalog entry is tagged with, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextTag {
    Time(TimeTag),
    Day(DayTag),
}

/// Wall-clock sample used for contextual selection.
#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    pub hour: u32,
    /// 0 = Sunday .. 6 = Saturday
    pub weekday: u32,
}

impl LocalClock {
    pub fn time_tag(&self) -> TimeTag {
        TimeTag::from_hour(self.hour)
    }

    pub fn day_tag(&self) -> DayTag {
        DayTag::from_weekday(self.weekday)
    }

    pub fn matches(&self, tag: ContextTag) -> bool {
        match tag {
            ContextTag::Time(t) => t == self.time_tag(),
            ContextTag::Day(d) => d == self.day_tag(),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn now() -> Self {
        let date = js_sys::Date::new_0();
        Self {
            hour: date.get_hours(),
            weekday: date.get_day(),
        }
    }

    /// Native fallback computes UTC hour/weekday from the system clock.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn now() -> Self {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            hour: ((secs / 3600) % 24) as u32,
            // The epoch fell on a Thursday (weekday 4)
            weekday: (((secs / 86_400) + 4) % 7) as u32,
        }
    }
}

/// One catalog entry: a keyed message with an optional context tag.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub key: &'static str,
    pub kind: MessageKind,
    pub text: &'static str,
    pub label: Option<&'static str>,
    pub context: Option<ContextTag>,
}

const fn phrase(key: &'static str, text: &'static str, context: Option<ContextTag>) -> CatalogEntry {
    CatalogEntry {
        key,
        kind: MessageKind::Phrase,
        text,
        label: None,
        context,
    }
}

const fn symbol(key: &'static str, text: &'static str, label: &'static str) -> CatalogEntry {
    CatalogEntry {
        key,
        kind: MessageKind::Symbol,
        text,
        label: Some(label),
        context: None,
    }
}

const fn badge(key: &'static str, text: &'static str) -> CatalogEntry {
    CatalogEntry {
        key,
        kind: MessageKind::Badge,
        text,
        label: None,
        context: None,
    }
}

use ContextTag::{Day, Time};

/// Built-in English catalog. A host localization provider can replace it
/// wholesale via [`MessageCatalog::with_entries`].
pub const DEFAULT_CATALOG: &[CatalogEntry] = &[
    // Time-of-day contextual phrases (4 per tag)
    phrase("morning-hello", "Good morning!", Some(Time(TimeTag::Morning))),
    phrase("morning-coffee", "Coffee first?", Some(Time(TimeTag::Morning))),
    phrase("morning-fresh", "Fresh start today.", Some(Time(TimeTag::Morning))),
    phrase("morning-sun", "Rise and shine!", Some(Time(TimeTag::Morning))),
    phrase("afternoon-hello", "Good afternoon!", Some(Time(TimeTag::Afternoon))),
    phrase("afternoon-stretch", "Time to stretch?", Some(Time(TimeTag::Afternoon))),
    phrase("afternoon-snack", "Snack break soon?", Some(Time(TimeTag::Afternoon))),
    phrase("afternoon-focus", "Deep focus hours.", Some(Time(TimeTag::Afternoon))),
    phrase("evening-hello", "Good evening!", Some(Time(TimeTag::Evening))),
    phrase("evening-winddown", "Winding down?", Some(Time(TimeTag::Evening))),
    phrase("evening-dinner", "Dinner plans?", Some(Time(TimeTag::Evening))),
    phrase("evening-save", "Save your work!", Some(Time(TimeTag::Evening))),
    phrase("night-owl", "Night owl mode.", Some(Time(TimeTag::LateNight))),
    phrase("night-rest", "Sleep is a feature.", Some(Time(TimeTag::LateNight))),
    phrase("night-quiet", "So quiet out there.", Some(Time(TimeTag::LateNight))),
    phrase("night-stars", "Stars are out.", Some(Time(TimeTag::LateNight))),
    // Day-of-week contextual phrases (4 per tag)
    phrase("monday-new", "New week, new bugs.", Some(Day(DayTag::Monday))),
    phrase("monday-go", "Monday! Let's go.", Some(Day(DayTag::Monday))),
    phrase("monday-plan", "Plan the week?", Some(Day(DayTag::Monday))),
    phrase("monday-slow", "Easing into Monday.", Some(Day(DayTag::Monday))),
    phrase("friday-nearly", "Nearly the weekend!", Some(Day(DayTag::Friday))),
    phrase("friday-ship", "Ship it Friday?", Some(Day(DayTag::Friday))),
    phrase("friday-wrap", "Wrapping up the week.", Some(Day(DayTag::Friday))),
    phrase("friday-fun", "Friday feeling!", Some(Day(DayTag::Friday))),
    phrase("weekend-here", "Weekend mode.", Some(Day(DayTag::Weekend))),
    phrase("weekend-relax", "Relax a little.", Some(Day(DayTag::Weekend))),
    phrase("weekend-project", "Side project time?", Some(Day(DayTag::Weekend))),
    phrase("weekend-outside", "Go outside too!", Some(Day(DayTag::Weekend))),
    phrase("workday-steady", "Steady as she goes.", Some(Day(DayTag::Workday))),
    phrase("workday-midweek", "Midweek momentum.", Some(Day(DayTag::Workday))),
    phrase("workday-break", "Took a break lately?", Some(Day(DayTag::Workday))),
    phrase("workday-water", "Hydrate!", Some(Day(DayTag::Workday))),
    // Universal symbols and badges, always eligible
    symbol("sym-heart", "\u{2764}", "heart"),
    symbol("sym-sparkle", "\u{2728}", "sparkles"),
    symbol("sym-coffee", "\u{2615}", "coffee"),
    symbol("sym-note", "\u{266a}", "musical note"),
    badge("badge-100", "100"),
    badge("badge-lgtm", "LGTM"),
    // Plain phrases, sampled at a fixed fraction
    phrase("hello", "Hello there!", None),
    phrase("watching", "Just watching.", None),
    phrase("company", "Keeping you company.", None),
    phrase("nice-code", "Nice code today.", None),
    phrase("hum", "Hmm hm hmm...", None),
    phrase("wave", "*waves*", None),
    phrase("thinking", "Thinking...", None),
    phrase("nap", "Almost nap time.", None),
    phrase("tidy", "Tidy desk, tidy mind.", None),
    phrase("commit", "Commit early, commit often.", None),
    phrase("test", "Did you run the tests?", None),
    phrase("backup", "Backups are love.", None),
    phrase("shortcut", "Learned a shortcut lately?", None),
    phrase("posture", "Posture check!", None),
    phrase("window", "Look out a window.", None),
    phrase("smile", ":)", None),
];

/// The current set of messages. Treated as read-only input supplied by the
/// host's localization layer; the built-in English table is the default.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    entries: Vec<CatalogEntry>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self {
            entries: DEFAULT_CATALOG.to_vec(),
        }
    }
}

impl MessageCatalog {
    pub fn with_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Draw one message.
    ///
    /// Contextual weighting builds the pool described in the module docs;
    /// with it disabled the draw is uniform over every entry.
    pub fn pick<R: Rng>(&self, clock: &LocalClock, contextual: bool, rng: &mut R) -> Option<Message> {
        if self.entries.is_empty() {
            return None;
        }

        if !contextual {
            return self.entries.choose(rng).map(Self::to_message);
        }

        let mut pool: Vec<&CatalogEntry> = Vec::new();
        let mut plain: Vec<&CatalogEntry> = Vec::new();

        for entry in &self.entries {
            match entry.context {
                Some(tag) if clock.matches(tag) => {
                    for _ in 0..CONTEXT_WEIGHT {
                        pool.push(entry);
                    }
                }
                Some(_) => {} // wrong context, excluded
                None => match entry.kind {
                    MessageKind::Symbol | MessageKind::Badge => pool.push(entry),
                    MessageKind::Phrase => plain.push(entry),
                },
            }
        }

        let sample_count = ((plain.len() as f32) * SAMPLE_FRACTION).round() as usize;
        pool.extend(plain.iter().copied().choose_multiple(rng, sample_count));

        pool.choose(rng).map(|e| Self::to_message(e))
    }

    fn to_message(entry: &CatalogEntry) -> Message {
        Message {
            kind: entry.kind,
            text: entry.text.to_string(),
            label: entry.label.map(str::to_string),
        }
    }
}

/// Randomized-interval emission timer, deadline-based like every other delay
/// in the core.
#[derive(Debug, Clone, Copy)]
pub struct MessageScheduler {
    next_at: f64,
}

impl MessageScheduler {
    pub fn new() -> Self {
        Self { next_at: f64::MAX }
    }

    /// Arm the next emission at a random interval within the configured
    /// bounds.
    pub fn schedule<R: Rng>(&mut self, now: f64, settings: &Settings, rng: &mut R) {
        let (min, max) = settings.message_interval_ms();
        self.next_at = now + rng.random_range(min..=max);
    }

    /// Disarm the pending emission (a forced message cancels the timer).
    pub fn cancel(&mut self) {
        self.next_at = f64::MAX;
    }

    pub fn due(&self, now: f64) -> bool {
        now >= self.next_at
    }
}

impl Default for MessageScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_pcg::Pcg32;

    fn wednesday_morning() -> LocalClock {
        LocalClock {
            hour: 9,
            weekday: 3,
        }
    }

    #[test]
    fn time_tags_cover_all_hours() {
        assert_eq!(TimeTag::from_hour(6), TimeTag::Morning);
        assert_eq!(TimeTag::from_hour(13), TimeTag::Afternoon);
        assert_eq!(TimeTag::from_hour(19), TimeTag::Evening);
        assert_eq!(TimeTag::from_hour(2), TimeTag::LateNight);
        assert_eq!(TimeTag::from_hour(23), TimeTag::LateNight);
    }

    #[test]
    fn day_tags() {
        assert_eq!(DayTag::from_weekday(1), DayTag::Monday);
        assert_eq!(DayTag::from_weekday(5), DayTag::Friday);
        assert_eq!(DayTag::from_weekday(0), DayTag::Weekend);
        assert_eq!(DayTag::from_weekday(6), DayTag::Weekend);
        assert_eq!(DayTag::from_weekday(3), DayTag::Workday);
    }

    #[test]
    fn empty_catalog_yields_nothing() {
        let catalog = MessageCatalog::with_entries(Vec::new());
        let mut rng = Pcg32::new(1, 1);
        assert!(catalog.pick(&wednesday_morning(), true, &mut rng).is_none());
    }

    #[test]
    fn wrong_context_entries_are_excluded() {
        let catalog = MessageCatalog::default();
        let clock = wednesday_morning();
        let mut rng = Pcg32::new(42, 0);
        for _ in 0..2_000 {
            let msg = catalog.pick(&clock, true, &mut rng).unwrap();
            // No evening/weekend phrases on a Wednesday morning
            assert_ne!(msg.text, "Good evening!");
            assert_ne!(msg.text, "Weekend mode.");
        }
    }

    /// With one active time context and one day context, tripled contextual
    /// entries make up 24 of the 34-entry pool, a ~70% share. Statistical:
    /// checks convergence, not exact equality.
    #[test]
    fn contextual_share_converges_to_seventy_percent() {
        let catalog = MessageCatalog::default();
        let clock = wednesday_morning();
        let mut rng = Pcg32::new(0xdead_beef, 0);

        let contextual_keys: Vec<&str> = DEFAULT_CATALOG
            .iter()
            .filter(|e| matches!(e.context, Some(tag) if clock.matches(tag)))
            .map(|e| e.key)
            .collect();
        assert_eq!(contextual_keys.len(), 8);

        let draws = 10_000;
        let mut hits = 0usize;
        for _ in 0..draws {
            let msg = catalog.pick(&clock, true, &mut rng).unwrap();
            let is_ctx = DEFAULT_CATALOG
                .iter()
                .any(|e| e.text == msg.text && contextual_keys.contains(&e.key));
            if is_ctx {
                hits += 1;
            }
        }

        let share = hits as f64 / draws as f64;
        assert!(
            (0.64..=0.78).contains(&share),
            "contextual share {share} out of expected band"
        );
    }

    #[test]
    fn unweighted_draw_reaches_every_context() {
        let catalog = MessageCatalog::default();
        let clock = wednesday_morning();
        let mut rng = Pcg32::new(3, 3);
        let mut saw_evening = false;
        for _ in 0..5_000 {
            let msg = catalog.pick(&clock, false, &mut rng).unwrap();
            if msg.text == "Good evening!" {
                saw_evening = true;
                break;
            }
        }
        assert!(saw_evening, "uniform draw must include off-context entries");
    }

    #[test]
    fn scheduler_deadline_lifecycle() {
        let settings = Settings::default();
        let mut rng = Pcg32::new(9, 9);
        let mut scheduler = MessageScheduler::new();
        assert!(!scheduler.due(1e12));

        scheduler.schedule(1_000.0, &settings, &mut rng);
        assert!(!scheduler.due(1_000.0));
        let (_, max) = settings.message_interval_ms();
        assert!(scheduler.due(1_000.0 + max + 1.0));

        scheduler.cancel();
        assert!(!scheduler.due(1e12));
    }
}
