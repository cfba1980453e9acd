//! Fixed backend paths

pub const CHAT: &str = "/chat";
pub const QUERY: &str = "/query";
pub const HEALTH: &str = "/health";

pub const DB_STRUCTURE: &str = "/db-structure";
pub const HEALTH_DATA: &str = "/api/health_data";

pub const REVIEWS: &str = "/api/reviews";

pub const SCRAPE_TIKI: &str = "/api/scrape/tiki";
pub const SCRAPE_TIKI_CATEGORY: &str = "/api/scrape/tiki/category";
pub const SCRAPE_TIKI_ELECTRONICS: &str = "/api/scrape/tiki/electronics";

pub const ELECTRONICS_CATEGORIES: &str = "/api/electronics/categories";

/// May not exist on every backend deployment
pub const TEXT_TO_SQL: &str = "/api/text2sql";

/// Path for a user's health data record
pub fn health_data(user_id: &str) -> String {
    format!("{}/{}", HEALTH_DATA, urlencoded(user_id))
}

/// Review listing path with the given query parameters, if any
pub fn reviews(params: &[(String, String)]) -> String {
    if params.is_empty() {
        return REVIEWS.to_string();
    }
    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoded(k), urlencoded(v)))
        .collect();
    format!("{}?{}", REVIEWS, query.join("&"))
}

/// Form-style encoding: unreserved characters pass through, spaces become
/// `+`, everything else is percent-encoded byte by byte.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_reviews_without_params() {
        assert_eq!(reviews(&[]), "/api/reviews");
    }

    #[test]
    fn test_reviews_with_params_keeps_order() {
        let path = reviews(&params(&[("product", "iphone 15"), ("limit", "10")]));
        assert_eq!(path, "/api/reviews?product=iphone+15&limit=10");
    }

    #[test]
    fn test_urlencoded_escapes_reserved_and_unicode() {
        assert_eq!(urlencoded("a&b=c"), "a%26b%3Dc");
        assert_eq!(urlencoded("tai nghe không dây"), "tai+nghe+kh%C3%B4ng+d%C3%A2y");
    }

    #[test]
    fn test_health_data_path() {
        assert_eq!(health_data("42"), "/api/health_data/42");
    }
}
