//! Built-in responders: canned tables, clock replies, and arithmetic.
//!
//! Everything here is stateless. Table picks are uniform random per call.

use chrono::{DateTime, Local};
use rand::seq::IndexedRandom;

use crate::error::MathError;
use crate::math;

pub const JOKES: &[&str] = &[
    "Why do programmers prefer dark mode? Because light attracts bugs.",
    "I told my computer I needed a break, and it said: no problem, I'll go to sleep.",
];

pub const RIDDLES: &[&str] = &[
    "What has keys but can't open locks? A piano.",
    "What gets wetter the more it dries? A towel.",
    "What has to be broken before you can use it? An egg.",
];

pub const QUOTES: &[&str] = &[
    "\"The only way to do great work is to love what you do.\" - Steve Jobs",
    "\"Simplicity is the soul of efficiency.\" - Austin Freeman",
    "\"Talk is cheap. Show me the code.\" - Linus Torvalds",
];

pub const GREETINGS: &[&str] = &[
    "Hi there! How can I help you today?",
    "Hello! What's on your mind?",
    "Hey! Nice to see you.",
];

/// Generic prompts returned when nothing else produced a reply.
pub const FALLBACK_PROMPTS: &[&str] = &[
    "I'm not sure about that yet. Ask me for a joke, a riddle, or a quote!",
    "Hmm, I don't know that one. Try asking me the time or a math question.",
    "I didn't quite get that. You can ask me for a joke, a quote, or some quick math.",
];

// Replies of the generation path.
pub const BASIC_GREETING: &str = "Hello! I'm Tina 🌸 How can I assist you today?";
pub const FAREWELL: &str = "Goodbye! Talk to you soon 👋";
pub const IDENTITY: &str = "I'm Tina, your friendly chatbot assistant.";
pub const WEATHER: &str =
    "I can't give live weather updates yet, but you can check a weather app 🌤️";
pub const HELP: &str = "Sure! Tell me what you need help with.";

fn pick(table: &'static [&'static str]) -> &'static str {
    table.choose(&mut rand::rng()).copied().unwrap_or_default()
}

pub fn joke() -> &'static str {
    pick(JOKES)
}

pub fn riddle() -> &'static str {
    pick(RIDDLES)
}

pub fn quote() -> &'static str {
    pick(QUOTES)
}

pub fn greeting() -> &'static str {
    pick(GREETINGS)
}

pub fn fallback_prompt() -> &'static str {
    pick(FALLBACK_PROMPTS)
}

/// Evaluate `expr` with the restricted arithmetic evaluator.
pub fn math(expr: &str) -> Result<String, MathError> {
    math::evaluate(expr)
}

pub fn time_reply(now: DateTime<Local>) -> String {
    format!("The current time is {}.", now.format("%H:%M"))
}

pub fn date_reply(now: DateTime<Local>) -> String {
    format!("Today's date is {}.", now.format("%Y-%m-%d"))
}

/// Reply used by the generation path when web access is not allowed.
pub fn offline_echo(message: &str) -> String {
    format!(
        "I'm not able to search the web right now. You said: {}",
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_table_picks_come_from_tables() {
        for _ in 0..50 {
            assert!(JOKES.contains(&joke()));
            assert!(RIDDLES.contains(&riddle()));
            assert!(QUOTES.contains(&quote()));
            assert!(GREETINGS.contains(&greeting()));
            assert!(FALLBACK_PROMPTS.contains(&fallback_prompt()));
        }
    }

    #[test]
    fn test_two_jokes() {
        assert_eq!(JOKES.len(), 2);
    }

    #[test]
    fn test_math_delegates_to_evaluator() {
        assert_eq!(math("2 + 2").as_deref(), Ok("4"));
        assert!(math("import os").is_err());
    }

    #[test]
    fn test_clock_replies() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
        assert_eq!(time_reply(now), "The current time is 07:05.");
        assert_eq!(date_reply(now), "Today's date is 2024-03-09.");
    }

    #[test]
    fn test_offline_echo() {
        assert_eq!(
            offline_echo("quantum"),
            "I'm not able to search the web right now. You said: quantum"
        );
    }
}
