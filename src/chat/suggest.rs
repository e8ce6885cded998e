//! Keyword-based content suggestions shown under a chat reply.
//!
//! DESIGN
//! ======
//! Six topics are checked in declaration order. A topic fires when any of
//! its keywords is a substring of the lowercased input; there is no
//! tokenization or stemming, so "learn" fires the income topic via "earn".
//! Fired topics contribute their picks in order and the concatenation is
//! cut to [`MAX_SUGGESTIONS`]. Earlier topics always win; nothing is ranked.

use serde::Serialize;

/// Upper bound on suggestions returned per query.
pub const MAX_SUGGESTIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Article,
    Tool,
}

impl SuggestionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Tool => "tool",
        }
    }
}

/// A recommended article or tool. Built per query, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub title: &'static str,
    pub link: &'static str,
}

// =============================================================================
// CATALOG
// =============================================================================

const fn article(title: &'static str, link: &'static str) -> Suggestion {
    Suggestion { kind: SuggestionKind::Article, title, link }
}

const fn tool(title: &'static str, link: &'static str) -> Suggestion {
    Suggestion { kind: SuggestionKind::Tool, title, link }
}

pub const INVESTING_ARTICLE: Suggestion =
    article("Getting Started with Investing: A Gen Z Guide", "src/pages/article.html?id=1");
pub const BUDGETING_ARTICLE: Suggestion =
    article("The 50/30/20 Rule: Budgeting Made Simple", "src/pages/article.html?id=2");
pub const SAVING_ARTICLE: Suggestion =
    article("Automate Your Savings: Set It and Forget It", "src/pages/article.html?id=3");
pub const CREDIT_ARTICLE: Suggestion =
    article("Understanding Credit Scores: Why They Matter for Gen Z", "src/pages/article.html?id=4");
pub const INCOME_ARTICLE: Suggestion =
    article("Side Hustles for College Students: Earn While You Learn", "src/pages/article.html?id=5");

pub const BUDGET_PLANNER: Suggestion = tool("Budget Planner", "src/pages/tools.html#budget-planner");
pub const SAVINGS_CALCULATOR: Suggestion = tool("Savings Goal Calculator", "src/pages/tools.html#savings-calculator");
pub const SUBSCRIPTION_TRACKER: Suggestion =
    tool("Subscription Tracker", "src/pages/tools.html#subscription-tracker");

struct Topic {
    name: &'static str,
    keywords: &'static [&'static str],
    picks: &'static [Suggestion],
}

impl Topic {
    fn fires(&self, folded: &str) -> bool {
        self.keywords.iter().any(|kw| folded.contains(kw))
    }
}

const TOPICS: [Topic; 6] = [
    Topic {
        name: "investing",
        keywords: &["invest", "stock", "etf", "portfolio", "market", "return", "dividend"],
        picks: &[INVESTING_ARTICLE],
    },
    Topic {
        name: "budgeting",
        keywords: &["budget", "50/30/20", "spending", "expense", "income", "track", "allocate"],
        picks: &[BUDGETING_ARTICLE, BUDGET_PLANNER],
    },
    Topic {
        name: "saving",
        keywords: &["save", "automate", "emergency fund", "goal", "automatic", "direct deposit"],
        picks: &[SAVING_ARTICLE, SAVINGS_CALCULATOR],
    },
    Topic {
        name: "credit",
        keywords: &["credit score", "credit card", "fico", "loan", "debt", "interest rate", "borrow"],
        picks: &[CREDIT_ARTICLE],
    },
    Topic {
        name: "income",
        keywords: &["side hustle", "earn", "job", "income", "money", "gig", "freelance", "work"],
        picks: &[INCOME_ARTICLE],
    },
    Topic {
        name: "tools",
        keywords: &["calculator", "planner", "tracker", "subscription", "tool", "plan", "calculate"],
        picks: &[BUDGET_PLANNER, SAVINGS_CALCULATOR, SUBSCRIPTION_TRACKER],
    },
];

// =============================================================================
// MATCHING
// =============================================================================

/// Return up to [`MAX_SUGGESTIONS`] suggestions for `text`, in topic order.
#[must_use]
pub fn match_suggestions(text: &str) -> Vec<Suggestion> {
    let folded = text.to_lowercase();
    TOPICS
        .iter()
        .filter(|topic| topic.fires(&folded))
        .flat_map(|topic| topic.picks.iter().copied())
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Names of every topic that fires for `text`, including ones whose picks
/// are cut by truncation. Used for diagnostics.
#[must_use]
pub fn fired_topics(text: &str) -> Vec<&'static str> {
    let folded = text.to_lowercase();
    TOPICS
        .iter()
        .filter(|topic| topic.fires(&folded))
        .map(|topic| topic.name)
        .collect()
}

#[cfg(test)]
#[path = "suggest_test.rs"]
mod tests;
