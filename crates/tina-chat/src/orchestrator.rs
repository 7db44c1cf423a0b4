//! Dialogue orchestrator: the top-level `respond` decision sequence.
//!
//! Two dispatch paths live here and stay separate:
//!
//! - [`DialogueOrchestrator::respond`] resolves pronouns from session
//!   memory, classifies with the standard rules, answers built-in intents,
//!   and otherwise walks knowledge store -> web search -> canned prompt.
//! - [`DialogueOrchestrator::get_reply`] is stateless, classifies with the
//!   basic rules, and hands unknown utterances to the language model.
//!
//! [`DialogueOrchestrator::dispatch`] picks one of them by [`DispatchMode`].

use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info};

use tina_core::types::{DispatchMode, Intent, Role, Turn};
use tina_storage::KnowledgeStore;

use crate::classifier::IntentRules;
use crate::memory::SessionMemory;
use crate::provider::{GenerationProvider, SearchProvider};
use crate::responders;

/// Reply to empty or whitespace-only input.
pub const EMPTY_INPUT_REPLY: &str = "Please say something 🙂";

/// Coordinates classification, built-in responders, and the fallback chain.
pub struct DialogueOrchestrator {
    knowledge: Arc<KnowledgeStore>,
    search: Arc<dyn SearchProvider>,
    generator: Arc<dyn GenerationProvider>,
}

impl DialogueOrchestrator {
    pub fn new(
        knowledge: Arc<KnowledgeStore>,
        search: Arc<dyn SearchProvider>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            knowledge,
            search,
            generator,
        }
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeStore> {
        &self.knowledge
    }

    /// Run the selected dispatch path and return the reply text.
    pub async fn dispatch(
        &self,
        mode: DispatchMode,
        memory: &mut SessionMemory,
        text: &str,
        allow_web: bool,
    ) -> String {
        match mode {
            DispatchMode::Search => self.respond(memory, text, allow_web).await.reply,
            DispatchMode::Generation => self.get_reply(text, allow_web).await,
        }
    }

    /// Handle one utterance against `memory`.
    ///
    /// Built-in intents return right after the user entry is recorded, so
    /// they add a single transcript entry. Fallback replies (knowledge, web
    /// search, canned prompt) also record the assistant entry.
    pub async fn respond(&self, memory: &mut SessionMemory, text: &str, allow_web: bool) -> Turn {
        if text.trim().is_empty() {
            return Turn {
                input: text.to_string(),
                resolved: text.to_string(),
                reply: EMPTY_INPUT_REPLY.to_string(),
                intent: None,
            };
        }

        let resolved = memory.resolve(text);
        let intent = IntentRules::standard().classify(&resolved);
        memory.record(Role::User, resolved.as_str());
        debug!(
            intent = intent.as_str(),
            substituted = resolved != text,
            "Utterance classified"
        );

        let reply = match self.builtin(intent, &resolved) {
            Some(reply) => reply,
            None => self.fallback(memory, &resolved, allow_web).await,
        };

        Turn {
            input: text.to_string(),
            resolved,
            reply,
            intent: Some(intent),
        }
    }

    /// Stateless path: basic rules, then the language model when allowed.
    pub async fn get_reply(&self, text: &str, allow_web: bool) -> String {
        if text.trim().is_empty() {
            return EMPTY_INPUT_REPLY.to_string();
        }

        let intent = IntentRules::basic().classify(text);
        debug!(intent = intent.as_str(), "Utterance classified (basic rules)");

        match intent {
            Intent::Greeting => responders::BASIC_GREETING.to_string(),
            Intent::Farewell => responders::FAREWELL.to_string(),
            Intent::Identity => responders::IDENTITY.to_string(),
            Intent::Time => responders::time_reply(Local::now()),
            Intent::Date => responders::date_reply(Local::now()),
            Intent::Weather => responders::WEATHER.to_string(),
            Intent::Help => responders::HELP.to_string(),
            _ if allow_web => {
                info!(provider = self.generator.name(), "Delegating to language model");
                self.generator.generate(text).await
            }
            _ => responders::offline_echo(text),
        }
    }

    // -- Private helpers --

    /// Built-in answer for `intent`, or `None` to continue down the chain.
    fn builtin(&self, intent: Intent, resolved: &str) -> Option<String> {
        match intent {
            Intent::Joke => Some(responders::joke().to_string()),
            Intent::Riddle => Some(responders::riddle().to_string()),
            Intent::Quote => Some(responders::quote().to_string()),
            Intent::Greeting => Some(responders::greeting().to_string()),
            Intent::Time => Some(responders::time_reply(Local::now())),
            Intent::Math => match responders::math(resolved.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!(error = %e, "Expression not evaluable, falling through");
                    None
                }
            },
            _ => None,
        }
    }

    /// Knowledge store, then web search (both only with `allow_web`), then
    /// a canned prompt.
    async fn fallback(&self, memory: &mut SessionMemory, resolved: &str, allow_web: bool) -> String {
        let pending = responders::fallback_prompt();

        if allow_web {
            if let Some(hit) = self.knowledge.reply_for(resolved) {
                memory.record(Role::Assistant, hit.as_str());
                return hit;
            }

            match self.search.search(resolved).await {
                Some(result) if !result.trim().is_empty() => {
                    info!(provider = self.search.name(), "Answered from web search");
                    memory.set_last_entity(resolved);
                    memory.record(Role::Assistant, result.as_str());
                    return result;
                }
                _ => debug!(provider = self.search.name(), "Web search produced nothing"),
            }
        }

        memory.record(Role::Assistant, pending);
        pending.to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Map, Value};

    use tina_core::types::TranscriptEntry;

    use crate::responders::{FALLBACK_PROMPTS, GREETINGS, JOKES, QUOTES, RIDDLES};

    // ---- Stub providers ----

    struct StubSearch {
        reply: Option<String>,
        queries: Mutex<Vec<String>>,
    }

    impl StubSearch {
        fn new(reply: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchProvider for StubSearch {
        fn name(&self) -> &str {
            "stub-search"
        }

        async fn search(&self, query: &str) -> Option<String> {
            self.queries.lock().unwrap().push(query.to_string());
            self.reply.clone()
        }
    }

    struct StubGenerator {
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl StubGenerator {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationProvider for StubGenerator {
        fn name(&self) -> &str {
            "stub-generator"
        }

        async fn generate(&self, prompt: &str) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            format!("generated: {}", prompt)
        }
    }

    fn knowledge(entries: Value) -> Arc<KnowledgeStore> {
        let map: Map<String, Value> = match entries {
            Value::Object(m) => m,
            _ => Map::new(),
        };
        Arc::new(KnowledgeStore::with_entries(Path::new("knowledge.json"), map))
    }

    fn orchestrator(
        search: &Arc<StubSearch>,
        generator: &Arc<StubGenerator>,
    ) -> DialogueOrchestrator {
        DialogueOrchestrator::new(
            knowledge(json!({})),
            Arc::clone(search) as Arc<dyn SearchProvider>,
            Arc::clone(generator) as Arc<dyn GenerationProvider>,
        )
    }

    fn setup(search_reply: Option<&str>) -> (DialogueOrchestrator, Arc<StubSearch>, Arc<StubGenerator>) {
        let search = StubSearch::new(search_reply);
        let generator = StubGenerator::new();
        (orchestrator(&search, &generator), search, generator)
    }

    // ---- Empty input ----

    #[tokio::test]
    async fn test_empty_input_short_circuits_without_mutation() {
        let (orch, search, _) = setup(Some("S"));
        let mut memory = SessionMemory::new();
        for text in ["", "   ", "\n\t"] {
            let turn = orch.respond(&mut memory, text, true).await;
            assert_eq!(turn.reply, EMPTY_INPUT_REPLY);
            assert!(turn.intent.is_none());
        }
        assert_eq!(memory, SessionMemory::new());
        assert!(search.queries().is_empty());
    }

    // ---- Built-in intents ----

    #[tokio::test]
    async fn test_joke_records_only_user_entry() {
        let (orch, search, _) = setup(Some("S"));
        let mut memory = SessionMemory::new();
        let turn = orch.respond(&mut memory, "Tell me a joke", false).await;

        assert!(JOKES.contains(&turn.reply.as_str()));
        assert_eq!(turn.intent, Some(Intent::Joke));
        // Built-in replies return before the assistant entry is appended.
        assert_eq!(memory.transcript(), &[TranscriptEntry::user("Tell me a joke")]);
        assert!(search.queries().is_empty());
    }

    #[tokio::test]
    async fn test_riddle_quote_greeting() {
        let (orch, _, _) = setup(None);
        let mut memory = SessionMemory::new();

        let reply = orch.respond(&mut memory, "a riddle please", false).await.reply;
        assert!(RIDDLES.contains(&reply.as_str()));

        let reply = orch.respond(&mut memory, "quote of the day", false).await.reply;
        assert!(QUOTES.contains(&reply.as_str()));

        let reply = orch.respond(&mut memory, "hello", false).await.reply;
        assert!(GREETINGS.contains(&reply.as_str()));

        assert_eq!(memory.transcript().len(), 3);
    }

    #[tokio::test]
    async fn test_time_reply() {
        let (orch, _, _) = setup(None);
        let mut memory = SessionMemory::new();
        let turn = orch.respond(&mut memory, "what time is it", false).await;
        assert_eq!(turn.intent, Some(Intent::Time));
        assert!(turn.reply.starts_with("The current time is "));
        assert_eq!(memory.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_math_success_returns_value() {
        let (orch, search, _) = setup(Some("S"));
        let mut memory = SessionMemory::new();
        let turn = orch.respond(&mut memory, "2 + 2", true).await;
        assert_eq!(turn.reply, "4");
        assert_eq!(turn.intent, Some(Intent::Math));
        assert_eq!(memory.transcript().len(), 1);
        assert!(search.queries().is_empty());
    }

    #[tokio::test]
    async fn test_deeply_nested_math_falls_through() {
        let (orch, search, _) = setup(Some("S"));
        let mut memory = SessionMemory::new();
        for text in [
            format!("{}1", "(".repeat(50_000)),
            format!("{}1", "-".repeat(200_000)),
        ] {
            let turn = orch.respond(&mut memory, &text, false).await;
            assert_eq!(turn.intent, Some(Intent::Math));
            assert!(FALLBACK_PROMPTS.contains(&turn.reply.as_str()));
        }
        assert_eq!(memory.transcript().len(), 4);
        assert!(search.queries().is_empty());
    }

    #[tokio::test]
    async fn test_math_failure_falls_through_to_fallback() {
        let (orch, search, generator) = setup(Some("S"));
        let mut memory = SessionMemory::new();
        let turn = orch.respond(&mut memory, "I have 3 cats", false).await;

        assert_eq!(turn.intent, Some(Intent::Math));
        assert!(FALLBACK_PROMPTS.contains(&turn.reply.as_str()));
        assert_eq!(memory.transcript().len(), 2);
        assert!(search.queries().is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_math_failure_falls_through_to_search() {
        let (orch, search, _) = setup(Some("Cats are small carnivores."));
        let mut memory = SessionMemory::new();
        let turn = orch.respond(&mut memory, "I have 3 cats", true).await;
        assert_eq!(turn.reply, "Cats are small carnivores.");
        assert_eq!(search.queries(), vec!["I have 3 cats".to_string()]);
    }

    #[tokio::test]
    async fn test_digit_and_time_takes_math_path() {
        // Digit rule precedes the time rule; "5 time" is not evaluable.
        let (orch, _, _) = setup(None);
        let mut memory = SessionMemory::new();
        let turn = orch.respond(&mut memory, "5 time", false).await;
        assert_eq!(turn.intent, Some(Intent::Math));
        assert!(FALLBACK_PROMPTS.contains(&turn.reply.as_str()));
    }

    // ---- Fallback chain ----

    #[tokio::test]
    async fn test_unknown_without_web_never_calls_adapters() {
        let (orch, search, generator) = setup(Some("S"));
        let mut memory = SessionMemory::new();
        for _ in 0..10 {
            let turn = orch.respond(&mut memory, "tell me about rust", false).await;
            assert!(FALLBACK_PROMPTS.contains(&turn.reply.as_str()));
        }
        assert!(search.queries().is_empty());
        assert_eq!(generator.calls(), 0);
        assert!(memory.last_entity().is_none());

        let last = memory.transcript().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(FALLBACK_PROMPTS.contains(&last.text.as_str()));
    }

    #[tokio::test]
    async fn test_search_result_returned_and_remembered() {
        let (orch, search, generator) = setup(Some("S"));
        let mut memory = SessionMemory::new();

        let turn = orch.respond(&mut memory, "Ada Lovelace", true).await;
        assert_eq!(turn.reply, "S");
        assert_eq!(memory.last_entity(), Some("Ada Lovelace"));
        assert_eq!(
            memory.transcript(),
            &[
                TranscriptEntry::user("Ada Lovelace"),
                TranscriptEntry::assistant("S")
            ]
        );

        let turn = orch.respond(&mut memory, "tell me about her", true).await;
        assert_eq!(turn.resolved, "tell me about Ada Lovelace");
        assert_eq!(
            search.queries(),
            vec![
                "Ada Lovelace".to_string(),
                "tell me about Ada Lovelace".to_string()
            ]
        );
        assert_eq!(memory.transcript()[2], TranscriptEntry::user("tell me about Ada Lovelace"));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_search_result_uses_fallback() {
        for reply in [None, Some(""), Some("   ")] {
            let (orch, search, _) = setup(reply);
            let mut memory = SessionMemory::new();
            let turn = orch.respond(&mut memory, "obscure topic", true).await;
            assert!(FALLBACK_PROMPTS.contains(&turn.reply.as_str()));
            assert!(memory.last_entity().is_none());
            assert_eq!(search.queries().len(), 1);
            assert_eq!(memory.transcript().len(), 2);
        }
    }

    #[tokio::test]
    async fn test_pronouns_resolved_before_classification() {
        let (orch, _, _) = setup(None);
        let mut memory = SessionMemory::new();
        memory.set_last_entity("a joke");
        let turn = orch.respond(&mut memory, "tell me her", false).await;
        assert_eq!(turn.resolved, "tell me a joke");
        assert_eq!(turn.intent, Some(Intent::Joke));
        assert_eq!(memory.transcript()[0].text, "tell me a joke");
    }

    #[tokio::test]
    async fn test_knowledge_hit_before_search() {
        let search = StubSearch::new(Some("S"));
        let generator = StubGenerator::new();
        let orch = DialogueOrchestrator::new(
            knowledge(json!({"capital of france": "Paris"})),
            Arc::clone(&search) as Arc<dyn SearchProvider>,
            Arc::clone(&generator) as Arc<dyn GenerationProvider>,
        );
        let mut memory = SessionMemory::new();

        let turn = orch.respond(&mut memory, "Capital of France", true).await;
        assert_eq!(turn.reply, "Paris");
        assert!(search.queries().is_empty());
        assert!(memory.last_entity().is_none());
        assert_eq!(memory.transcript()[1], TranscriptEntry::assistant("Paris"));

        // Knowledge is only consulted when network lookups are allowed.
        let turn = orch.respond(&mut memory, "capital of france", false).await;
        assert!(FALLBACK_PROMPTS.contains(&turn.reply.as_str()));
    }

    // ---- Generation path ----

    #[tokio::test]
    async fn test_get_reply_basic_intents() {
        let (orch, _, generator) = setup(None);
        assert_eq!(orch.get_reply("hello", true).await, responders::BASIC_GREETING);
        assert_eq!(orch.get_reply("bye", true).await, responders::FAREWELL);
        assert_eq!(orch.get_reply("who are you", true).await, responders::IDENTITY);
        assert!(orch.get_reply("time?", true).await.starts_with("The current time is "));
        assert!(orch.get_reply("date?", true).await.starts_with("Today's date is "));
        assert_eq!(orch.get_reply("weather", true).await, responders::WEATHER);
        assert_eq!(orch.get_reply("help", true).await, responders::HELP);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_get_reply_unknown_goes_to_generator() {
        let (orch, search, generator) = setup(Some("S"));
        let reply = orch.get_reply("Explain quantum tunnelling", true).await;
        assert_eq!(reply, "generated: Explain quantum tunnelling");
        assert_eq!(generator.calls(), 1);
        assert!(search.queries().is_empty());
    }

    #[tokio::test]
    async fn test_get_reply_unknown_offline_echoes() {
        let (orch, _, generator) = setup(None);
        let reply = orch.get_reply("2 + 2", false).await;
        assert_eq!(reply, "I'm not able to search the web right now. You said: 2 + 2");
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_get_reply_empty_input() {
        let (orch, _, generator) = setup(None);
        assert_eq!(orch.get_reply("  ", true).await, EMPTY_INPUT_REPLY);
        assert_eq!(generator.calls(), 0);
    }

    // ---- Strategy selection ----

    #[tokio::test]
    async fn test_dispatch_generation_leaves_memory_untouched() {
        let (orch, search, generator) = setup(Some("S"));
        let mut memory = SessionMemory::new();
        let reply = orch
            .dispatch(DispatchMode::Generation, &mut memory, "tell me about rust", true)
            .await;
        assert_eq!(reply, "generated: tell me about rust");
        assert_eq!(memory, SessionMemory::new());
        assert!(search.queries().is_empty());
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_search_uses_respond() {
        let (orch, search, generator) = setup(Some("S"));
        let mut memory = SessionMemory::new();
        let reply = orch
            .dispatch(DispatchMode::Search, &mut memory, "tell me about rust", true)
            .await;
        assert_eq!(reply, "S");
        assert_eq!(memory.transcript().len(), 2);
        assert_eq!(search.queries().len(), 1);
        assert_eq!(generator.calls(), 0);
    }
}
