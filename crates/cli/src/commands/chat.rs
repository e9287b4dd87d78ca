//! `planweave chat` — Interactive or single-message chat mode.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use planweave_agent::AgentLoop;
use planweave_config::Settings;
use planweave_core::message::Message;
use planweave_core::search::SearchOptions;
use planweave_core::state::ConversationState;
use planweave_core::tool::ToolRegistry;
use planweave_providers::{GeminiModel, TavilyClient};
use planweave_tools::{UpdatePlanTool, WebResearchTool};

pub async fn run(message: Option<String>, show_plan: bool) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API keys early — give a clear error
    let Some(gemini_key) = settings.gemini_api_key.clone() else {
        eprintln!();
        eprintln!("  ERROR: No Gemini API key configured!");
        eprintln!();
        eprintln!("  Set the environment variable:");
        eprintln!("    export GEMINI_API_KEY='...'");
        eprintln!();
        eprintln!("  Or add `gemini_api_key` to planweave.toml in the current directory.");
        eprintln!("  Get a key at: https://aistudio.google.com/apikey");
        eprintln!();
        return Err("No Gemini API key found. See above for setup instructions.".into());
    };
    let Some(tavily_key) = settings.tavily_api_key.clone() else {
        eprintln!();
        eprintln!("  ERROR: No Tavily API key configured!");
        eprintln!();
        eprintln!("  Set the environment variable:");
        eprintln!("    export TAVILY_API_KEY='tvly-...'");
        eprintln!();
        eprintln!("  Or add `tavily_api_key` to planweave.toml in the current directory.");
        eprintln!("  Get a key at: https://tavily.com");
        eprintln!();
        return Err("No Tavily API key found. See above for setup instructions.".into());
    };

    // Build providers from config
    let model = Arc::new(GeminiModel::new(gemini_key, settings.model.clone()));
    let search = Arc::new(TavilyClient::new(tavily_key));

    // Build tools
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(
        UpdatePlanTool::new(model.clone()).with_temperature(settings.temperature),
    ));
    registry.register(Box::new(
        WebResearchTool::new(search)
            .with_max_tokens_per_source(settings.research.max_tokens_per_source)
            .with_options(SearchOptions {
                include_raw_content: settings.research.include_raw_content,
                topic: settings.research.topic.clone(),
            }),
    ));
    let tools = Arc::new(registry);

    // Build the agent loop
    let mut agent = AgentLoop::new(model, tools)
        .with_temperature(settings.temperature)
        .with_max_model_attempts(settings.agent.max_model_attempts)
        .with_retry_base_delay(Duration::from_millis(settings.agent.retry_base_delay_ms))
        .with_max_self_corrections(settings.agent.max_self_corrections);
    if let Some(max) = settings.max_tokens {
        agent = agent.with_max_tokens(max);
    }
    if let Some(secs) = settings.agent.deadline_secs {
        agent = agent.with_deadline(Duration::from_secs(secs));
    }

    let mut state = ConversationState::new();

    if let Some(msg) = message {
        // Single message mode
        state.push(Message::user(&msg));

        eprint!("  Thinking...");
        let response = agent.run(&mut state).await?;
        eprint!("\r              \r");
        println!("{response}");
    } else {
        // Interactive mode
        println!();
        println!("  Planweave — learning-plan research agent");
        println!();
        println!("  Model:  {}", settings.model);
        println!("  Tools:  web_research, update_learning_plan");
        println!();
        println!("  Tell me what you want to learn and how long you have.");
        println!("  Type 'exit' or Ctrl+D to quit.");
        println!();

        let stdin = std::io::stdin();

        loop {
            print!("  You > ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if input == "exit" || input == "quit" {
                break;
            }

            state.push(Message::user(input));

            eprint!("  ...");
            match agent.run(&mut state).await {
                Ok(response) => {
                    eprint!("\r     \r");
                    println!();
                    for line in response.lines() {
                        println!("  Assistant > {line}");
                    }
                    println!();
                }
                Err(e) => {
                    eprint!("\r     \r");
                    eprintln!("  [Error] {e}");
                    println!();
                }
            }
        }

        println!();
        println!("  Goodbye!");
        println!();
    }

    if show_plan {
        match &state.learning_plan {
            Some(plan) => println!("{}", serde_json::to_string_pretty(plan)?),
            None => eprintln!("  No learning plan was produced in this conversation."),
        }
    }

    Ok(())
}
