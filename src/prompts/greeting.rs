//! Greeting prompt.

use crate::error::Result;
use crate::prompts::registry::PromptHandler;
use crate::protocol::{GetPromptResult, HandlerContext, Prompt, PromptArgument, PromptMessage};
use async_trait::async_trait;
use std::collections::HashMap;

const DEFAULT_STYLE: &str = "friendly";

fn style_sentence(style: &str) -> &'static str {
    match style {
        "formal" => "Please write a formal, professional greeting",
        "casual" => "Please write a casual, relaxed greeting",
        _ => "Please write a warm, friendly greeting",
    }
}

/// `greet_user(name, style)`: asks the model for a greeting in a given style.
pub struct GreetUserPrompt;

#[async_trait]
impl<C: Send + Sync + 'static> PromptHandler<C> for GreetUserPrompt {
    fn definition(&self) -> Prompt {
        Prompt {
            name: "greet_user".into(),
            description: Some("Generate a greeting prompt".into()),
            arguments: Some(vec![
                PromptArgument {
                    name: "name".into(),
                    description: Some("Who to greet".into()),
                    required: Some(true),
                },
                PromptArgument {
                    name: "style".into(),
                    description: Some("friendly, formal or casual".into()),
                    required: Some(false),
                },
            ]),
        }
    }

    async fn render(
        &self,
        _ctx: &HandlerContext<C>,
        arguments: HashMap<String, String>,
    ) -> Result<GetPromptResult> {
        let name = arguments.get("name").map(String::as_str).unwrap_or_default();
        let style = arguments
            .get("style")
            .map(String::as_str)
            .unwrap_or(DEFAULT_STYLE);

        Ok(GetPromptResult {
            description: Some(format!("Greeting for {}", name)),
            messages: vec![PromptMessage::user(format!(
                "{} for someone named {}.",
                style_sentence(style),
                name
            ))],
        })
    }
}
