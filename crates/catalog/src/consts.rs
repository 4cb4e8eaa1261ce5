use regex::{Regex, RegexSet};
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Title patterns of summaries, guides, companions and other works that are
/// *about* a book rather than the book itself. Matched against the lowercased
/// title; any single hit is enough.
const DERIVATIVE_PATTERNS: &[&str] = &[
    // Summaries
    r"summary",
    r"summarized",
    r"cliff'?s?\s*notes",
    r"spark\s*notes",
    r"book\s*summary",
    r"minute\s*summary",
    // Study guides and analysis
    r"study\s*guide",
    r"reading\s*guide",
    r"teacher'?s?\s*guide",
    r"lesson\s*plans?",
    r"student\s*guide",
    r"companion",
    r"analysis",
    r"critical\s*analysis",
    // Reviews and commentary
    r"book\s*review",
    r"review\s*and\s*analysis",
    r"commentary",
    // Workbooks and exercises
    r"workbook",
    r"activity\s*book",
    r"coloring\s*book",
    // Adaptations
    r"graphic\s*novel\s*adaptation",
    r"comic\s*adaptation",
    // Box sets and collections
    r"box\s*set",
    r"boxed\s*set",
    r"\d+\s*book\s*set",
    r"\d+\s*book\s*collection",
    r"complete\s*collection",
    r"complete\s*set",
    r"\d+\s*volume\s*set",
    r"omnibus",
    // Special editions and merchandise
    r"poster\s*book",
    r"art\s*book",
    r"movie\s*companion",
    r"cinematic\s*guide",
    r"film\s*companion",
    r"behind\s*the\s*scenes",
    r"making\s*of",
    r"official\s*guide",
    r"visual\s*companion",
    r"illustrated\s*edition",
    r"pop-up\s*book",
    // Book clubs and annotated editions
    r"book\s*club\s*(?:guide|kit|questions)",
    r"discussion\s*(?:guide|questions)",
    r"annotated\s*edition",
    r"footnoted",
    // Textbooks and curricula
    r"textbook",
    r"curriculum",
    // Generic phrasing
    r"^(?:a\s*)?guide\s*to",
    r":\s*a\s*summary",
    r"in\s*\d+\s*minutes?",
    r"key\s*takeaways",
];

pub(crate) static DERIVATIVE_TITLES: LazyLock<RegexSet> =
    LazyLock::new(|| RegexSet::new(DERIVATIVE_PATTERNS).unwrap());

/// Author names that carry no attribution at all.
pub(crate) const AUTHOR_SENTINELS: &[&str] = &["unknown", "unknown author", "anonymous", "anon", "n/a"];

// Four-digit years between 1900 and 2099 somewhere in a free-form date.
regex!(YEAR_REGEX, r"\b(?:19|20)\d{2}\b");
// Open Library work (W) or edition (M) identifiers.
regex!(OLID_REGEX, r"^OL\d+[WM]$");

/// Dropped before slugifying: quotation marks ('"‘’“”„‛`«»‹›) and full stops,
/// so "Sorcerer's" and "J.K." stay in one piece.
pub(crate) const SLUG_STRIPPED: &[char] = &[
    '\u{0027}', '\u{0022}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{201E}', '\u{201B}', '\u{0060}',
    '\u{00AB}', '\u{00BB}', '\u{2039}', '\u{203A}', '.',
];
