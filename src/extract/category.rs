//! Sport category detection for general-coverage sites
//!
//! Sites with a single sport focus carry their category in the registry;
//! everything else gets classified here from the URL path first (the most
//! reliable signal) and keyword frequency in the text second.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Category assigned when no specific sport can be identified
pub const DEFAULT_CATEGORY: &str = "sports";

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("football", &["football", "nfl", "touchdown", "quarterback"]),
    (
        "soccer",
        &[
            "soccer",
            "premier league",
            "la liga",
            "bundesliga",
            "serie a",
            "champions league",
            "fifa",
            "midfielder",
            "striker",
        ],
    ),
    ("basketball", &["basketball", "nba", "wnba", "three-pointer", "dunk"]),
    (
        "cricket",
        &["cricket", "ipl", "test match", "t20", "wicket", "bowler", "batsman"],
    ),
    (
        "tennis",
        &["tennis", "wimbledon", "grand slam", "french open", "australian open"],
    ),
    ("baseball", &["baseball", "mlb", "home run", "pitcher", "batting"]),
    ("hockey", &["hockey", "nhl", "puck", "goalie", "stanley cup"]),
    ("golf", &["golf", "pga", "masters", "birdie", "hole-in-one"]),
    ("rugby", &["rugby", "scrum", "six nations"]),
    ("boxing", &["boxing", "heavyweight", "knockout", "bout"]),
    ("mma", &["mma", "ufc", "mixed martial arts", "octagon"]),
    ("f1", &["formula 1", "f1", "grand prix", "pole position", "pit stop"]),
    ("motorsport", &["motorsport", "nascar", "motogp", "indycar"]),
    ("athletics", &["athletics", "track and field", "marathon", "sprint"]),
    ("olympics", &["olympics", "olympic games", "gold medal"]),
];

// Word-boundary matchers compiled once per keyword
static CONTENT_MATCHERS: Lazy<Vec<(&'static str, Vec<Regex>)>> = Lazy::new(|| {
    CATEGORY_KEYWORDS
        .iter()
        .map(|(category, keywords)| {
            let patterns = keywords
                .iter()
                .filter_map(|kw| Regex::new(&format!(r"\b{}\b", regex::escape(kw))).ok())
                .collect();
            (*category, patterns)
        })
        .collect()
});

// Minimum keyword hits before trusting a content-based classification
const MIN_CONTENT_SCORE: usize = 2;

/// Detects the sport category of an article
///
/// Returns [`DEFAULT_CATEGORY`] when neither the URL nor the text identifies
/// a specific sport.
pub fn detect_category(url: &str, title: &str, content: &str) -> String {
    if let Some(category) = detect_from_url(url) {
        return category.to_string();
    }

    if let Some(category) = detect_from_content(title, content) {
        return category.to_string();
    }

    DEFAULT_CATEGORY.to_string()
}

fn detect_from_url(url: &str) -> Option<&'static str> {
    let path = Url::parse(url).ok()?.path().to_lowercase();

    for (category, keywords) in CATEGORY_KEYWORDS {
        if path.contains(&format!("/{}", category)) || path.contains(&format!("-{}", category)) {
            return Some(category);
        }

        for keyword in *keywords {
            let slug = keyword.replace(' ', "-");
            if path.contains(&slug) {
                return Some(category);
            }
        }
    }

    None
}

fn detect_from_content(title: &str, content: &str) -> Option<&'static str> {
    // the opening of an article names its sport; the tail is often boilerplate
    let window: String = content.chars().take(2000).collect();
    let text = format!("{} {}", title, window).to_lowercase();

    let mut best: Option<(&'static str, usize)> = None;

    for (category, patterns) in CONTENT_MATCHERS.iter() {
        let score: usize = patterns.iter().map(|re| re.find_iter(&text).count()).sum();
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((category, score));
        }
    }

    match best {
        Some((category, score)) if score >= MIN_CONTENT_SCORE => Some(category),
        _ => None,
    }
}
