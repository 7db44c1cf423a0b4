//! Keyword intent classifier.
//!
//! Intents are decided by an ordered list of rules evaluated top to bottom;
//! the first matching rule wins. Matching is plain substring search on the
//! trimmed, lower-cased text, so "hi" also matches inside "this" and
//! "think". Rule order is part of the contract: a message that contains a
//! digit is `Math` even when it also mentions "time".

use std::sync::LazyLock;

use tina_core::types::Intent;

// =============================================================================
// Rules
// =============================================================================

/// How a rule tests the normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Any of the literal substrings occurs.
    AnySubstring(&'static [&'static str]),
    /// Any character is an ASCII decimal digit.
    AnyDigit,
}

impl Matcher {
    fn is_match(&self, normalized: &str) -> bool {
        match self {
            Matcher::AnySubstring(needles) => needles.iter().any(|n| normalized.contains(n)),
            Matcher::AnyDigit => normalized.chars().any(|c| c.is_ascii_digit()),
        }
    }
}

/// One `matcher => intent` entry of a rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentRule {
    pub matcher: Matcher,
    pub intent: Intent,
}

const fn rule(matcher: Matcher, intent: Intent) -> IntentRule {
    IntentRule { matcher, intent }
}

static STANDARD: LazyLock<IntentRules> = LazyLock::new(|| {
    IntentRules::new(vec![
        rule(Matcher::AnySubstring(&["hi", "hello", "hey"]), Intent::Greeting),
        rule(Matcher::AnySubstring(&["joke"]), Intent::Joke),
        rule(Matcher::AnySubstring(&["riddle"]), Intent::Riddle),
        rule(Matcher::AnySubstring(&["quote"]), Intent::Quote),
        // Digits before "time": "wake me at 7 time" is math.
        rule(Matcher::AnyDigit, Intent::Math),
        rule(Matcher::AnySubstring(&["time"]), Intent::Time),
    ])
});

static BASIC: LazyLock<IntentRules> = LazyLock::new(|| {
    IntentRules::new(vec![
        rule(Matcher::AnySubstring(&["hello", "hi"]), Intent::Greeting),
        rule(Matcher::AnySubstring(&["bye", "goodbye"]), Intent::Farewell),
        rule(
            Matcher::AnySubstring(&["your name", "who are you"]),
            Intent::Identity,
        ),
        rule(Matcher::AnySubstring(&["time"]), Intent::Time),
        rule(Matcher::AnySubstring(&["date"]), Intent::Date),
        rule(Matcher::AnySubstring(&["weather"]), Intent::Weather),
        rule(Matcher::AnySubstring(&["help"]), Intent::Help),
    ])
});

// =============================================================================
// IntentRules
// =============================================================================

/// An ordered, first-match-wins rule list. Falls back to `Intent::Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRules {
    rules: Vec<IntentRule>,
}

impl IntentRules {
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// Rules used by `respond`: greeting, joke, riddle, quote, math, time.
    pub fn standard() -> &'static IntentRules {
        &STANDARD
    }

    /// Rules used by the generation path: greeting, farewell, identity,
    /// time, date, weather, help.
    pub fn basic() -> &'static IntentRules {
        &BASIC
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Classify `text`. Case-insensitive; surrounding whitespace ignored.
    pub fn classify(&self, text: &str) -> Intent {
        let normalized = text.trim().to_lowercase();
        self.rules
            .iter()
            .find(|r| r.matcher.is_match(&normalized))
            .map(|r| r.intent)
            .unwrap_or(Intent::Unknown)
    }
}

/// Classify with the standard rule list.
pub fn classify(text: &str) -> Intent {
    IntentRules::standard().classify(text)
}

// =============================================================================
// Tests
// =============================================================================
