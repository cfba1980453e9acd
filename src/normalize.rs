//! Cleaning of raw chatbot answers
//!
//! The chat backend sometimes answers with half-structured markdown mixed with
//! its own analysis scaffolding (query result breakdowns, SQL, example data).
//! [`clean`] strips that scaffolding and falls back to canned guidance when
//! nothing useful is left.
//!
//! The rules track the backend's answer template. When that template changes,
//! add a regression case to the tests below.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Returned for a missing or empty answer
pub const NO_INFORMATION_MESSAGE: &str = "I could not find information about that product.";

/// Returned when the backend says it found nothing for the product
pub const NO_REVIEWS_MESSAGE: &str = "Sorry, I could not find reviews for this product. Please try:\n\
- Enter the exact product name (e.g., \"iPhone 15 Pro Max\")\n\
- Check if the product exists on Tiki\n\
- Or try a different product";

/// Returned when almost nothing is left after cleaning
pub const EMPTY_ANSWER_MESSAGE: &str = "Sorry, the backend did not return data. Possible issues:\n\
- Backend not running\n\
- Product not in database\n\
- No reviews available for this product\n\
\n\
Please check the logs for detailed errors.";

/// Labels marking an answer that follows the expected review summary template
const STRUCTURED_LABELS: [&str; 4] = [
    "**Pros:**",
    "**Cons:**",
    "**Key Features:**",
    "**Customer Sentiment:**",
];

/// Answers at or below this many characters are treated as empty
const MIN_USEFUL_CHARS: usize = 20;

/// Section headers removed up to the next `**` or `$$`, or the end of text
static SCAFFOLD_HEADERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)# Analysis of Query Results",
        r"(?i)## Key Trends and Patterns",
        r"(?i)## Notable Insights",
        r"(?i)### Overall Ratings",
        r"(?i)### Review Titles",
        r"(?i)### Content Analysis",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("static regex"))
    .collect()
});

static CONCLUSION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)## Conclusion").expect("static regex"));

static EXAMPLE_DATA_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)## Example Data.*?```.*?```").expect("static regex"));

static SQL_QUERY_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\[SQL_QUERY\].*?\[/SQL_QUERY\]").expect("static regex")
});

static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("static regex"));

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\d+\.\s+").expect("static regex"));

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static regex"));

static NO_DATA_FOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)no (data|reviews?|information) (found|available)").expect("static regex")
});

/// Cleans a raw chatbot answer for display.
///
/// Returns the cleaned text when it follows the review summary template or
/// carries more than a few words, and one of the canned messages otherwise.
pub fn clean(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(text) if !text.is_empty() => text,
        _ => return NO_INFORMATION_MESSAGE.to_string(),
    };

    let mut cleaned = raw.to_string();
    for header in SCAFFOLD_HEADERS.iter() {
        cleaned = strip_sections(&cleaned, header);
    }
    cleaned = EXAMPLE_DATA_BLOCK.replace_all(&cleaned, "").into_owned();
    cleaned = strip_sections(&cleaned, &CONCLUSION_HEADER);

    cleaned = SQL_QUERY_BLOCK.replace_all(&cleaned, "").into_owned();
    cleaned = CODE_BLOCK.replace_all(&cleaned, "").into_owned();
    cleaned = NUMBERED_ITEM.replace_all(&cleaned, "- ").into_owned();
    cleaned = EXCESS_NEWLINES.replace_all(&cleaned, "\n\n").into_owned();
    let cleaned = cleaned.trim();

    if STRUCTURED_LABELS.iter().any(|label| cleaned.contains(label)) {
        return cleaned.to_string();
    }

    if cleaned.chars().count() > MIN_USEFUL_CHARS {
        if NO_DATA_FOUND.is_match(cleaned) {
            debug!("backend reported no data for the product");
            return NO_REVIEWS_MESSAGE.to_string();
        }
        return cleaned.to_string();
    }

    debug!(
        raw_len = raw.len(),
        "answer empty after cleaning, using fallback message"
    );
    EMPTY_ANSWER_MESSAGE.to_string()
}

/// Removes every match of `header` together with the text after it, up to
/// (not including) the next `**` or `$$`, or to the end of `text`.
fn strip_sections(text: &str, header: &Regex) -> String {
    let mut out = String::with_capacity(text.len());
    let mut kept_from = 0;

    while let Some(found) = header.find_at(text, kept_from) {
        out.push_str(&text[kept_from..found.start()]);
        kept_from = section_end(text, found.end());
    }

    out.push_str(&text[kept_from..]);
    out
}

fn section_end(text: &str, from: usize) -> usize {
    let rest = &text[from..];
    [rest.find("**"), rest.find("$$")]
        .into_iter()
        .flatten()
        .min()
        .map(|offset| from + offset)
        .unwrap_or(text.len())
}
