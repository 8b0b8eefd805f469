//! Cheap pre-filter deciding whether a query might need a tool.

use serde::{Deserialize, Serialize};

const DEFAULT_KEYWORDS: &[&str] = &[
    "stock",
    "price",
    "market",
    "share",
    "ticker",
    "trading",
    "$",
    "nasdaq",
    "nyse",
    "dow",
    "sp500",
    "s&p",
    "investment",
];

const DEFAULT_SYMBOLS: &[&str] = &["AAPL", "MSFT", "GOOGL", "AMZN", "META", "TSLA", "NVDA", "AMD"];

/// The two fixed sets the classifier matches against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRules {
    /// Domain keywords, matched case-insensitively.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Ticker symbols, matched against the uppercased query.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
}

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

fn default_symbols() -> Vec<String> {
    DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

impl Default for RoutingRules {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            symbols: default_symbols(),
        }
    }
}

/// Classification of a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub needs_tool: bool,
}

/// Substring classifier over [`RoutingRules`].
///
/// False negatives go to plain chat; false positives reach the routing
/// prompt, where the model can still answer `GENERAL_QUERY`.
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    keywords: Vec<String>,
    symbols: Vec<String>,
}

impl QueryClassifier {
    pub fn new(rules: RoutingRules) -> Self {
        Self {
            keywords: rules
                .keywords
                .into_iter()
                .filter(|k| !k.is_empty())
                .map(|k| k.to_lowercase())
                .collect(),
            symbols: rules
                .symbols
                .into_iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_uppercase())
                .collect(),
        }
    }

    pub fn classify(&self, query: &str) -> Classification {
        let upper = query.to_uppercase();
        let lower = query.to_lowercase();

        let has_symbol = self.symbols.iter().any(|s| upper.contains(s.as_str()));
        let has_keyword = self.keywords.iter().any(|k| lower.contains(k.as_str()));

        Classification {
            needs_tool: has_symbol || has_keyword,
        }
    }
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new(RoutingRules::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn needs_tool(query: &str) -> bool {
        QueryClassifier::default().classify(query).needs_tool
    }

    #[test]
    fn every_default_keyword_routes_to_tools() {
        for keyword in DEFAULT_KEYWORDS {
            let query = format!("tell me about the {keyword} thing");
            assert!(needs_tool(&query), "{query}");
            assert!(needs_tool(&query.to_uppercase()), "{query}");
        }
    }

    #[test]
    fn every_default_symbol_routes_to_tools() {
        for symbol in DEFAULT_SYMBOLS {
            assert!(needs_tool(&format!("how is {symbol} doing")), "{symbol}");
            // The query is uppercased before matching symbols
            assert!(
                needs_tool(&format!("how is {} doing", symbol.to_lowercase())),
                "{symbol}"
            );
        }
    }

    #[test]
    fn plain_queries_stay_plain() {
        assert!(!needs_tool("hello, how are you?"));
        assert!(!needs_tool("What's MCP?"));
        assert!(!needs_tool("What's the capital of Japan?"));
        assert!(!needs_tool(""));
    }

    #[test]
    fn trading_query_needs_tool() {
        assert!(needs_tool("What's AAPL trading at?"));
        assert!(needs_tool("I have $1000 to spend"));
    }

    #[test]
    fn rules_are_swappable() {
        let classifier = QueryClassifier::new(RoutingRules {
            keywords: vec!["Weather".into()],
            symbols: vec!["sea".into()],
        });
        assert!(classifier.classify("weather tonight?").needs_tool);
        assert!(classifier.classify("flights to SEA").needs_tool);
        assert!(!classifier.classify("stock price of AAPL").needs_tool);
    }

    #[test]
    fn empty_entries_never_match() {
        let classifier = QueryClassifier::new(RoutingRules {
            keywords: vec![String::new()],
            symbols: vec![String::new()],
        });
        assert!(!classifier.classify("anything").needs_tool);
    }

    #[test]
    fn rules_deserialize_with_defaults() {
        let rules: RoutingRules = toml::from_str("keywords = [\"crypto\"]").unwrap();
        assert_eq!(rules.keywords, vec!["crypto".to_string()]);
        assert_eq!(rules.symbols, default_symbols());
    }
}
