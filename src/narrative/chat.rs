//! Conversational narrative: history, digest, summaries and sessions

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info};

use super::NarrativeBackend;
use crate::config::ChatConfig;
use crate::context::WellContext;
use crate::types::WellId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Rolling history keeping only the most recent `limit` entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHistory {
    entries: VecDeque<ChatMessage>,
    limit: usize,
}

impl ConversationHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn push(&mut self, role: ChatRole, content: impl Into<String>) {
        self.entries.push_back(ChatMessage {
            role,
            content: content.into(),
        });
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    /// Record one question and its answer
    pub fn push_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.push(ChatRole::User, question);
        self.push(ChatRole::Assistant, answer);
    }

    /// The last `n` entries, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `GR: 50.0-60.0 (avg 55.0); RHOB: ...` for the first `limit` curves with data.
pub fn stats_digest(context: &WellContext, limit: usize) -> String {
    context
        .value_curves()
        .iter()
        .filter_map(|name| {
            let s = context.statistics.get(name)?;
            match (s.min, s.max, s.mean) {
                (Some(min), Some(max), Some(mean)) => {
                    Some(format!("{}: {:.1}-{:.1} (avg {:.1})", name, min, max, mean))
                }
                _ => None,
            }
        })
        .take(limit)
        .collect::<Vec<_>>()
        .join("; ")
}

fn depth_unit(context: &WellContext) -> &str {
    context
        .curves
        .iter()
        .find(|c| c.is_depth_index())
        .and_then(|c| c.unit.as_deref())
        .filter(|u| !u.is_empty())
        .unwrap_or("ft")
}

/// Markdown greeting shown when a well is selected.
pub fn well_summary(context: &WellContext, shown_curves: usize) -> String {
    let count = context.curves.len();
    let names: Vec<&str> = context
        .curves
        .iter()
        .take(shown_curves)
        .map(|c| c.mnemonic.as_str())
        .collect();
    let more = if count > shown_curves { "..." } else { "" };

    format!(
        "**{}**\nDepth: {} - {} {}\n{} curves: {}{}\n{} data points\n\nAsk me anything about this well!",
        context.well.well_name,
        context.well.start_depth,
        context.well.stop_depth,
        depth_unit(context),
        count,
        names.join(", "),
        more,
        context.total_rows,
    )
}

/// System preamble describing the selected well.
pub fn chat_system_prompt(context: &WellContext, digest_curves: usize) -> String {
    let curves: Vec<String> = context.curves.iter().map(|c| c.label()).collect();
    format!(
        "You are a well-log data analyst. Be concise and helpful.\n\n\
         Well: {}\n\
         Depth: {}-{} {}, {} points\n\
         Curves: {}\n\
         Stats: {}\n\n\
         Answer questions about this well data. Use markdown. Be brief but informative.",
        context.well.well_name,
        context.well.start_depth,
        context.well.stop_depth,
        depth_unit(context),
        context.total_rows,
        curves.join(", "),
        stats_digest(context, digest_curves),
    )
}

/// Full prompt for one question: preamble, recent turns, then the question.
pub fn render_chat_prompt(
    context: &WellContext,
    history: &ConversationHistory,
    question: &str,
    config: &ChatConfig,
) -> String {
    let mut prompt = chat_system_prompt(context, config.digest_curves);
    prompt.push_str("\n\n");
    for msg in history.recent(config.prompt_history) {
        let speaker = match msg.role {
            ChatRole::User => "User",
            ChatRole::Assistant => "Assistant",
        };
        let _ = writeln!(prompt, "{}: {}", speaker, msg.content);
    }
    let _ = write!(prompt, "User: {}\nAssistant:", question);
    prompt
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("select a well before chatting")]
    NoWellSelected,
    #[error("message is empty")]
    EmptyMessage,
    #[error("narrative generation failed: {0:#}")]
    Backend(anyhow::Error),
}

/// One consumer's conversation about a selected well
pub struct ChatSession {
    consumer: String,
    config: ChatConfig,
    context: Option<Arc<WellContext>>,
    history: ConversationHistory,
}

impl ChatSession {
    pub fn new(consumer: impl Into<String>, config: ChatConfig) -> Self {
        Self {
            consumer: consumer.into(),
            history: ConversationHistory::new(config.history_limit),
            config,
            context: None,
        }
    }

    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    pub fn selected_well(&self) -> Option<WellId> {
        self.context.as_ref().map(|c| c.well.id)
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Switch to a well, reset history and return the greeting.
    pub fn select(&mut self, context: Arc<WellContext>) -> String {
        let summary = well_summary(&context, self.config.summary_curves);
        info!(consumer = %self.consumer, well_id = context.well.id, "Well selected for chat");
        self.context = Some(context);
        self.history.clear();
        summary
    }

    pub async fn ask(
        &mut self,
        backend: &dyn NarrativeBackend,
        question: &str,
    ) -> Result<String, ChatError> {
        let context = self.context.as_ref().ok_or(ChatError::NoWellSelected)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let prompt = render_chat_prompt(context, &self.history, question, &self.config);
        debug!(
            consumer = %self.consumer,
            backend = backend.backend_name(),
            prompt_chars = prompt.len(),
            "Sending chat prompt"
        );
        let answer = backend.generate(&prompt).await.map_err(ChatError::Backend)?;
        self.history.push_exchange(question, answer.clone());
        Ok(answer)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Curve, CurveStats, DepthRange, WellSummary};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NarrativeBackend for Recorder {
        async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            Ok(format!("answer {}", prompts.len()))
        }
        fn backend_name(&self) -> &'static str {
            "Recorder"
        }
    }

    fn curve(mnemonic: &str, unit: &str, index: u32) -> Curve {
        Curve {
            well_id: 1,
            mnemonic: mnemonic.to_string(),
            unit: Some(unit.to_string()),
            description: None,
            curve_index: index,
        }
    }

    fn stats(min: f64, max: f64, mean: f64) -> CurveStats {
        CurveStats {
            min: Some(min),
            max: Some(max),
            mean: Some(mean),
            std_dev: None,
            count: 3,
        }
    }

    fn context() -> Arc<WellContext> {
        Arc::new(WellContext {
            owner_id: 1,
            well: WellSummary {
                id: 1,
                well_name: "EAST-9".to_string(),
                field: None,
                company: None,
                location: None,
                country: None,
                start_depth: 1000.0,
                stop_depth: 1200.0,
                step: 0.5,
                created_at: chrono::Utc::now(),
            },
            curves: vec![
                curve("DEPT", "M", 0),
                curve("GR", "API", 1),
                curve("RHOB", "G/C3", 2),
                curve("NPHI", "", 3),
            ],
            statistics: [
                ("GR".to_string(), stats(12.04, 140.0, 65.26)),
                ("RHOB".to_string(), stats(2.1, 2.7, 2.46)),
                ("NPHI".to_string(), CurveStats::empty()),
            ]
            .into_iter()
            .collect(),
            sample: Vec::new(),
            total_rows: 401,
            range: DepthRange::ALL,
        })
    }

    #[test]
    fn test_history_caps_at_limit() {
        let mut history = ConversationHistory::new(10);
        for i in 0..7 {
            history.push_exchange(format!("q{}", i), format!("a{}", i));
        }
        assert_eq!(history.len(), 10);
        let first = history.recent(10).next().unwrap();
        assert_eq!(first.content, "q2");
        let recent: Vec<&str> = history.recent(6).map(|m| m.content.as_str()).collect();
        assert_eq!(recent, vec!["q4", "a4", "q5", "a5", "q6", "a6"]);
    }

    #[test]
    fn test_digest_skips_empty_and_uses_curve_order() {
        let digest = stats_digest(&context(), 10);
        assert_eq!(digest, "GR: 12.0-140.0 (avg 65.3); RHOB: 2.1-2.7 (avg 2.5)");
        assert_eq!(stats_digest(&context(), 1), "GR: 12.0-140.0 (avg 65.3)");
    }

    #[test]
    fn test_summary_and_system_prompt() {
        let ctx = context();
        let summary = well_summary(&ctx, 2);
        assert!(summary.starts_with("**EAST-9**"));
        assert!(summary.contains("Depth: 1000 - 1200 M"));
        assert!(summary.contains("4 curves: DEPT, GR..."));
        assert!(summary.contains("401 data points"));

        let system = chat_system_prompt(&ctx, 10);
        assert!(system.contains("Curves: DEPT (M), GR (API), RHOB (G/C3), NPHI"));
        assert!(system.contains("401 points"));
    }

    #[tokio::test]
    async fn test_session_flow() {
        let backend = Recorder {
            prompts: Mutex::new(Vec::new()),
        };
        let mut session = ChatSession::new("conn-1", ChatConfig::default());

        assert!(matches!(
            session.ask(&backend, "hi").await,
            Err(ChatError::NoWellSelected)
        ));

        session.select(context());
        assert_eq!(session.selected_well(), Some(1));
        assert!(matches!(session.ask(&backend, "  ").await, Err(ChatError::EmptyMessage)));

        for i in 0..5 {
            session.ask(&backend, &format!("question {}", i)).await.unwrap();
        }
        assert_eq!(session.history().len(), 10);

        let prompts = backend.prompts.lock().unwrap();
        let last = prompts.last().unwrap();
        assert!(last.contains("Well: EAST-9"));
        assert!(!last.contains("question 0"));
        assert!(last.contains("User: question 1\nAssistant: answer 2"));
        assert!(last.ends_with("User: question 4\nAssistant:"));
        drop(prompts);

        session.clear_history();
        assert!(session.history().is_empty());
    }
}
