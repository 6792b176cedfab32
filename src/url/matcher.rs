/// Checks if a domain is covered by an allow-list entry
///
/// Two pattern forms are accepted:
/// 1. Plain: "example.com" matches "example.com" and any subdomain of it
/// 2. Wildcard: "*.example.com" matches exactly the same set; the prefix is
///    accepted for readability
///
/// Both sides are compared case-insensitively.
///
/// # Examples
///
/// ```
/// use books_crawler::url::matches_domain;
///
/// assert!(matches_domain("books.toscrape.com", "books.toscrape.com"));
/// assert!(matches_domain("toscrape.com", "books.toscrape.com"));
/// assert!(matches_domain("*.toscrape.com", "quotes.toscrape.com"));
/// assert!(!matches_domain("books.toscrape.com", "toscrape.com"));
/// assert!(!matches_domain("toscrape.com", "nottoscrape.com"));
/// ```
pub fn matches_domain(pattern: &str, candidate: &str) -> bool {
    let base = pattern.strip_prefix("*.").unwrap_or(pattern);
    if base.is_empty() {
        return false;
    }

    let base = base.to_ascii_lowercase();
    let candidate = candidate.to_ascii_lowercase();

    candidate == base || candidate.ends_with(&format!(".{}", base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_domain("example.com", "example.com"));
        assert!(matches_domain("blog.example.com", "blog.example.com"));
    }

    #[test]
    fn test_plain_pattern_covers_subdomains() {
        assert!(matches_domain("example.com", "blog.example.com"));
        assert!(matches_domain("example.com", "api.v2.example.com"));
    }

    #[test]
    fn test_no_match_for_parent_or_sibling() {
        assert!(!matches_domain("blog.example.com", "example.com"));
        assert!(!matches_domain("blog.example.com", "shop.example.com"));
        assert!(!matches_domain("example.com", "other.com"));
    }

    #[test]
    fn test_wildcard_matches_bare_domain() {
        assert!(matches_domain("*.example.com", "example.com"));
        assert!(matches_domain("*.example.com", "www.example.com"));
    }

    #[test]
    fn test_no_match_partial_label() {
        assert!(!matches_domain("example.com", "myexample.com"));
        assert!(!matches_domain("*.example.com", "notexample.com"));
        assert!(!matches_domain("example.com", "example.com.org"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(matches_domain("Example.COM", "example.com"));
        assert!(matches_domain("example.com", "BLOG.Example.com"));
    }

    #[test]
    fn test_empty_strings() {
        assert!(!matches_domain("", "example.com"));
        assert!(!matches_domain("*.", "example.com"));
        assert!(!matches_domain("example.com", ""));
    }

    #[test]
    fn test_ip_address_host() {
        assert!(matches_domain("127.0.0.1", "127.0.0.1"));
        assert!(!matches_domain("127.0.0.1", "127.0.0.2"));
    }
}
