use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::error::{MnemoError, Result};
use crate::llm::LanguageModel;
use crate::memory::{ConversationMemory, WindowedContext};
use crate::message::Message;
use crate::prompt;
use crate::recall::MemoryStore;
use crate::tool::ToolRegistry;

/// Alternates between the language model and registered tools until the model
/// produces a final text answer.
pub struct Agent<M: LanguageModel> {
    system_prompt: String,
    model: Arc<M>,
    tools: ToolRegistry,
    memory: ConversationMemory,
    context: WindowedContext,
    max_steps: usize,
}

impl<M: LanguageModel> Agent<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self {
            system_prompt: "You are a helpful agent.".to_string(),
            model,
            tools: ToolRegistry::new(),
            memory: ConversationMemory::default(),
            context: WindowedContext::default(),
            max_steps: 6,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn with_context_window(mut self, window_size: usize) -> Self {
        self.context = WindowedContext::new(window_size);
        self
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run a single exchange. Returns the final assistant reply.
    pub async fn respond(&mut self, user_input: &str) -> Result<String> {
        let system = self.system_prompt.clone();
        self.respond_with_system(&system, user_input).await
    }

    /// One exchange with prior memory snippets spliced into the system prompt.
    /// Store failures are logged and the turn proceeds without them.
    pub async fn respond_with_recall(
        &mut self,
        store: &dyn MemoryStore,
        user_id: &str,
        user_input: &str,
    ) -> Result<String> {
        let records = match store.search(user_id, user_input).await {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, user_id, "memory search failed, continuing without recall");
                Vec::new()
            }
        };
        debug!(count = records.len(), user_id, "memory snippets retrieved");

        let system = prompt::compose(&self.system_prompt, &records);
        let reply = self.respond_with_system(&system, user_input).await?;

        let snippet = format!("User: {user_input}\nAssistant: {reply}");
        if let Err(err) = store.add(user_id, &snippet).await {
            warn!(%err, user_id, "failed to write turn back to memory");
        }

        Ok(reply)
    }

    async fn respond_with_system(&mut self, system: &str, user_input: &str) -> Result<String> {
        self.memory.push(Message::user(user_input));
        let descriptions = self.tools.describe();

        for _ in 0..self.max_steps {
            let mut context = vec![Message::system(system)];
            context.extend(self.context.select(self.memory.messages()));

            let completion = self.model.complete_chat(&context, &descriptions).await?;

            if completion.tool_calls.is_empty() {
                let content = completion.content.ok_or_else(|| {
                    MnemoError::Agent("model returned neither text nor a tool call".into())
                })?;
                self.memory.push(Message::assistant(&content));
                return Ok(content);
            }

            for call in completion.tool_calls {
                debug!(tool = %call.name, args = %call.arguments, "executing tool call");
                self.memory.push(Message::tool_call(call.clone()));

                // Tool failures go back to the model as an error payload so it
                // can explain the problem to the user (no retries here).
                let output = match self.tools.call(&call.name, call.arguments.clone()).await {
                    Ok(value) => value,
                    Err(err) => {
                        warn!(tool = %call.name, %err, "tool call failed");
                        json!({ "error": err.to_string() })
                    }
                };
                self.memory.push(Message::tool_result(&call.name, output));
            }
        }

        Err(MnemoError::Agent(
            "reached the step limit without a final answer".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;

    use crate::llm::{ModelCompletion, StubModel};
    use crate::message::Role;
    use crate::tool::Tool;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the payload back"
        }

        async fn call(&self, input: Value) -> Result<Value> {
            Ok(input)
        }
    }

    fn agent_with(completions: Vec<ModelCompletion>) -> Agent<StubModel> {
        let mut tools = ToolRegistry::new();
        tools.register(EchoTool);
        Agent::new(Arc::new(StubModel::new(completions))).with_tools(tools)
    }

    #[tokio::test]
    async fn returns_model_response_without_tools() {
        let mut agent = agent_with(vec![ModelCompletion::text("Hello!")]);

        let reply = agent.respond("hi").await.unwrap();

        assert_eq!(reply, "Hello!");
        assert_eq!(agent.memory().len(), 2);
    }

    #[tokio::test]
    async fn executes_tool_then_replies() {
        let mut agent = agent_with(vec![
            ModelCompletion::tool_call("echo", json!({"text": "ping"})),
            ModelCompletion::text("Echoed your request."),
        ]);

        let reply = agent.respond("say ping").await.unwrap();

        assert_eq!(reply, "Echoed your request.");
        // user, tool call, tool result, assistant
        assert_eq!(agent.memory().len(), 4);
        let result = agent.memory().iter().find(|m| m.role == Role::Tool).unwrap();
        assert_eq!(
            result.tool_result.as_ref().unwrap().output,
            json!({"text": "ping"})
        );
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_payload() {
        let mut agent = agent_with(vec![
            ModelCompletion::tool_call("no_such_tool", json!({})),
            ModelCompletion::text("That tool does not exist."),
        ]);

        let reply = agent.respond("use a bad tool").await.unwrap();

        assert_eq!(reply, "That tool does not exist.");
        let result = agent.memory().iter().find(|m| m.role == Role::Tool).unwrap();
        let output = &result.tool_result.as_ref().unwrap().output;
        assert!(output["error"].as_str().unwrap().contains("no_such_tool"));
    }

    #[tokio::test]
    async fn step_limit_is_enforced() {
        let completions = (0..4)
            .map(|_| ModelCompletion::tool_call("echo", json!({})))
            .collect();
        let mut agent = agent_with(completions).with_max_steps(3);

        let err = agent.respond("loop forever").await.unwrap_err();
        assert!(matches!(err, MnemoError::Agent(_)));
    }
}
