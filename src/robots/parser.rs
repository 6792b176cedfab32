//! Robots.txt rule evaluation on top of the robotstxt crate

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data for one domain
///
/// Rule matching is delegated to the robotstxt crate; crawl delays are read
/// here since the crate does not expose them.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
}

/// A `User-agent` group being read
#[derive(Default)]
struct Group {
    agents: Vec<String>,
    /// Set once a non user-agent line is seen; the next user-agent opens a new group
    closed: bool,
}

impl ParsedRobots {
    /// Wraps raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// A permissive robots.txt, used when none is published or it cannot be fetched
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Checks if a URL is allowed for the given user agent token
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the crawl delay (seconds) for a user agent
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let normalized_agent = user_agent.to_lowercase();
        let mut group = Group::default();
        let mut delay_for_agent: Option<f64> = None;
        let mut delay_for_wildcard: Option<f64> = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if group.closed {
                        group = Group::default();
                    }
                    group.agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    group.closed = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if !delay.is_finite() || delay < 0.0 {
                        continue;
                    }
                    if group
                        .agents
                        .iter()
                        .any(|agent| agent != "*" && normalized_agent.contains(agent.as_str()))
                    {
                        delay_for_agent = Some(delay);
                    } else if group.agents.iter().any(|agent| agent == "*") {
                        delay_for_wildcard = Some(delay);
                    }
                }
                _ => group.closed = true,
            }
        }

        delay_for_agent.or(delay_for_wildcard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://books.toscrape.com/catalogue/page-2.html";

    #[test]
    fn test_allow_all() {
        let robots = ParsedRobots::allow_all();
        assert!(robots.is_allowed(PAGE, "TestBot"));
        assert_eq!(robots.crawl_delay("TestBot"), None);
    }

    #[test]
    fn test_parse_disallow_all() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /");
        assert!(!robots.is_allowed("https://books.toscrape.com/", "TestBot"));
        assert!(!robots.is_allowed(PAGE, "TestBot"));
    }

    #[test]
    fn test_parse_disallow_specific() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /catalogue/category");
        assert!(robots.is_allowed(PAGE, "TestBot"));
        assert!(!robots.is_allowed(
            "https://books.toscrape.com/catalogue/category/books_1/index.html",
            "TestBot"
        ));
    }

    #[test]
    fn test_parse_allow_overrides_disallow() {
        let robots =
            ParsedRobots::from_content("User-agent: *\nDisallow: /catalogue\nAllow: /catalogue/page-2.html");
        assert!(robots.is_allowed(PAGE, "TestBot"));
        assert!(!robots.is_allowed("https://books.toscrape.com/catalogue/page-3.html", "TestBot"));
    }

    #[test]
    fn test_parse_specific_user_agent() {
        let robots = ParsedRobots::from_content("User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /");
        assert!(robots.is_allowed(PAGE, "GoodBot"));
        assert!(!robots.is_allowed(PAGE, "BadBot"));
    }

    #[test]
    fn test_garbage_robots_txt_allows() {
        let robots = ParsedRobots::from_content("This is not valid robots.txt {{{");
        assert!(robots.is_allowed(PAGE, "TestBot"));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 10\nDisallow: /admin");
        assert_eq!(robots.crawl_delay("TestBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_specific_agent_wins() {
        let robots = ParsedRobots::from_content(
            "User-agent: *\nCrawl-delay: 10\n\nUser-agent: TestBot\nCrawl-delay: 5",
        );
        assert_eq!(robots.crawl_delay("TestBot"), Some(5.0));
        assert_eq!(robots.crawl_delay("OtherBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_after_other_directives() {
        let robots = ParsedRobots::from_content("User-agent: TestBot\nDisallow: /x\nCrawl-delay: 3");
        assert_eq!(robots.crawl_delay("TestBot"), Some(3.0));
    }

    #[test]
    fn test_crawl_delay_group_boundary() {
        let robots = ParsedRobots::from_content(
            "User-agent: TestBot\nDisallow: /x\n\nUser-agent: OtherBot\nCrawl-delay: 9",
        );
        assert_eq!(robots.crawl_delay("TestBot"), None);
        assert_eq!(robots.crawl_delay("OtherBot"), Some(9.0));
    }

    #[test]
    fn test_crawl_delay_multiple_user_agents() {
        let robots = ParsedRobots::from_content("User-agent: BotA\nUser-agent: BotB\nCrawl-delay: 3");
        assert_eq!(robots.crawl_delay("BotA"), Some(3.0));
        assert_eq!(robots.crawl_delay("BotB"), Some(3.0));
        assert_eq!(robots.crawl_delay("BotC"), None);
    }

    #[test]
    fn test_crawl_delay_decimal_and_comments() {
        let robots = ParsedRobots::from_content("User-agent: * # everyone\nCrawl-delay: 2.5 # seconds");
        assert_eq!(robots.crawl_delay("TestBot"), Some(2.5));
    }

    #[test]
    fn test_crawl_delay_invalid_value_ignored() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: soon\nCrawl-delay: -1");
        assert_eq!(robots.crawl_delay("TestBot"), None);
    }

    #[test]
    fn test_crawl_delay_case_insensitive() {
        let robots = ParsedRobots::from_content("User-agent: TestBot\ncrawl-delay: 7");
        assert_eq!(robots.crawl_delay("testbot"), Some(7.0));
        assert_eq!(robots.crawl_delay("TESTBOT"), Some(7.0));
    }
}
