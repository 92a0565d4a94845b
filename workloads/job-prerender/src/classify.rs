//! Request classification: which requests get a prerendered page.

use std::fmt;

use edge_sdk::edge_core::RouteConfig;

/// Family a crawler identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotFamily {
    SearchEngine,
    AiFetcher,
    SocialUnfurler,
    GenericCrawler,
}

impl BotFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchEngine => "search-engine",
            Self::AiFetcher => "ai-fetcher",
            Self::SocialUnfurler => "social-unfurler",
            Self::GenericCrawler => "generic-crawler",
        }
    }
}

/// A lowercase token that identifies a crawler when it occurs anywhere in
/// the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotSignature {
    pub token: &'static str,
    pub family: BotFamily,
}

const fn sig(token: &'static str, family: BotFamily) -> BotSignature {
    BotSignature { token, family }
}

/// Known crawler identifiers, checked in order.
///
/// Matching is substring containment on the lowercased user agent, so short
/// tokens like `google` or `bing` deliberately over-match.
pub const BOT_SIGNATURES: &[BotSignature] = &[
    sig("adsbot", BotFamily::SearchEngine),
    sig("applebot", BotFamily::SearchEngine),
    sig("baiduspider", BotFamily::SearchEngine),
    sig("googlebot", BotFamily::SearchEngine),
    sig("mediapartners-google", BotFamily::SearchEngine),
    sig("yandex", BotFamily::SearchEngine),
    sig("yandexbot", BotFamily::SearchEngine),
    sig("bingbot", BotFamily::SearchEngine),
    sig("naver", BotFamily::SearchEngine),
    sig("baidu", BotFamily::SearchEngine),
    sig("bing", BotFamily::SearchEngine),
    sig("google", BotFamily::SearchEngine),
    sig("google-inspectiontool", BotFamily::SearchEngine),
    sig("gptbot", BotFamily::AiFetcher),
    sig("amazonbot", BotFamily::AiFetcher),
    sig("anthropic", BotFamily::AiFetcher),
    sig("bytespider", BotFamily::AiFetcher),
    sig("ccbot", BotFamily::AiFetcher),
    sig("chatgpt", BotFamily::AiFetcher),
    sig("claudebot", BotFamily::AiFetcher),
    sig("claude", BotFamily::AiFetcher),
    sig("oai-searchbot", BotFamily::AiFetcher),
    sig("perplexity", BotFamily::AiFetcher),
    sig("youbot", BotFamily::AiFetcher),
    sig("facebook", BotFamily::SocialUnfurler),
    sig("facebookexternalhit", BotFamily::SocialUnfurler),
    sig("meta-external", BotFamily::SocialUnfurler),
    sig("twitterbot", BotFamily::SocialUnfurler),
    sig("linkedinbot", BotFamily::SocialUnfurler),
    sig("slurp", BotFamily::GenericCrawler),
    sig("duckduckbot", BotFamily::GenericCrawler),
    sig("whatsapp", BotFamily::GenericCrawler),
    sig("telegram", BotFamily::GenericCrawler),
];

/// Why a request was or was not intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// Not a job detail page.
    NotJobPath,
    /// Job page, ordinary visitor.
    Human,
    /// Job page, known crawler.
    Bot,
    /// Job page, known crawler, but a method the route does not render.
    UnsupportedMethod,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJobPath => write!(f, "not-job-path"),
            Self::Human => write!(f, "human"),
            Self::Bot => write!(f, "bot"),
            Self::UnsupportedMethod => write!(f, "unsupported-method"),
        }
    }
}

/// Result of classifying one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Whether a prerendered response should be produced.
    pub intercept: bool,
    pub reason: Reason,
    /// The crawler identifier that matched, if any.
    pub signature: Option<&'static BotSignature>,
}

impl Classification {
    fn pass(reason: Reason) -> Self {
        Self {
            intercept: false,
            reason,
            signature: None,
        }
    }
}

/// First crawler identifier contained in the user agent.
pub fn detect_bot(user_agent: &str) -> Option<&'static BotSignature> {
    if user_agent.is_empty() {
        return None;
    }
    let ua = user_agent.to_lowercase();
    BOT_SIGNATURES.iter().find(|s| ua.contains(s.token))
}

/// The slug of a job page path, e.g. `rust-dev` for `/job/rust-dev`.
///
/// Returns `None` when the path is outside the route or the slug is empty.
pub fn slug_from_path<'a>(path: &'a str, route: &RouteConfig) -> Option<&'a str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    route.captured(path).filter(|slug| !slug.is_empty())
}

/// Classify a request by path and user agent.
///
/// Eligibility is the route prefix alone: `/job/` is a job page with an
/// empty slug.
pub fn classify(path: &str, user_agent: &str, route: &RouteConfig) -> Classification {
    if !route.matches(path) {
        return Classification::pass(Reason::NotJobPath);
    }

    match detect_bot(user_agent) {
        Some(signature) => Classification {
            intercept: true,
            reason: Reason::Bot,
            signature: Some(signature),
        },
        None => Classification::pass(Reason::Human),
    }
}

/// [`classify`], then pass through crawler requests whose method the route
/// does not accept.
pub fn classify_request(
    method: &str,
    path: &str,
    user_agent: &str,
    route: &RouteConfig,
) -> Classification {
    let classification = classify(path, user_agent, route);
    if classification.intercept && !route.accepts(method) {
        return Classification {
            intercept: false,
            reason: Reason::UnsupportedMethod,
            ..classification
        };
    }
    classification
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

    fn route() -> RouteConfig {
        RouteConfig::new("/job/*", "prerender")
    }

    #[test]
    fn test_googlebot_on_job_page() {
        let c = classify("/job/senior-seo-specialist", "Googlebot/2.1", &route());
        assert!(c.intercept);
        assert_eq!(c.reason, Reason::Bot);
        assert_eq!(c.signature.map(|s| s.family), Some(BotFamily::SearchEngine));
    }

    #[test]
    fn test_browser_is_human() {
        let c = classify("/job/senior-seo-specialist", CHROME, &route());
        assert!(!c.intercept);
        assert_eq!(c.reason, Reason::Human);
    }

    #[test]
    fn test_empty_user_agent_is_human() {
        assert_eq!(classify("/job/a", "", &route()).reason, Reason::Human);
    }

    #[test]
    fn test_other_paths_never_intercepted() {
        for path in ["/", "/jobs", "/jobs/a", "/about", "/job", "/api/job/a"] {
            for ua in ["Googlebot/2.1", "GPTBot/1.0", CHROME, ""] {
                let c = classify(path, ua, &route());
                assert!(!c.intercept, "{} with {:?}", path, ua);
                assert_eq!(c.reason, Reason::NotJobPath);
            }
        }
    }

    #[test]
    fn test_bare_prefix_is_a_job_page() {
        let c = classify("/job/", "Googlebot/2.1", &route());
        assert!(c.intercept);
        assert_eq!(c.reason, Reason::Bot);
        assert_eq!(classify("/job/", CHROME, &route()).reason, Reason::Human);
    }

    #[test]
    fn test_unsupported_method_passes_through() {
        let c = classify_request("POST", "/job/a", "Googlebot/2.1", &route());
        assert!(!c.intercept);
        assert_eq!(c.reason, Reason::UnsupportedMethod);
        assert_eq!(c.reason.to_string(), "unsupported-method");

        assert!(classify_request("HEAD", "/job/a", "Googlebot/2.1", &route()).intercept);
        assert_eq!(
            classify_request("TRACE", "/job/a", CHROME, &route()).reason,
            Reason::Human
        );
        assert_eq!(
            classify_request("PROPFIND", "/about", "Googlebot/2.1", &route()).reason,
            Reason::NotJobPath
        );
    }

    #[test]
    fn test_every_signature_matches_case_insensitively() {
        for sig in BOT_SIGNATURES {
            let ua = format!("Mozilla/5.0 (compatible; {}/1.0)", sig.token.to_uppercase());
            assert!(detect_bot(&ua).is_some(), "{}", sig.token);
        }
    }

    #[test]
    fn test_families() {
        let family = |ua: &str| detect_bot(ua).map(|s| s.family);
        assert_eq!(family("ClaudeBot/1.0"), Some(BotFamily::AiFetcher));
        assert_eq!(family("facebookexternalhit/1.1"), Some(BotFamily::SocialUnfurler));
        assert_eq!(family("DuckDuckBot/1.1"), Some(BotFamily::GenericCrawler));
        assert_eq!(family(CHROME), None);
    }

    #[test]
    fn test_substring_match_over_matches() {
        // Any agent mentioning "google" counts.
        assert!(detect_bot("Mozilla/5.0 GoogleOther").is_some());
    }

    #[test]
    fn test_slug_from_path() {
        assert_eq!(slug_from_path("/job/rust-dev", &route()), Some("rust-dev"));
        assert_eq!(slug_from_path("/job/rust-dev?ref=x", &route()), Some("rust-dev"));
        assert_eq!(slug_from_path("/job/", &route()), None);
        assert_eq!(slug_from_path("/jobs/rust-dev", &route()), None);
    }
}
