use std::env;
use std::sync::Arc;

use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use mnemo::config::AppConfig;
use mnemo::{logging, prompt, tools, Agent, GeminiClient, Mem0Client, Result};

const EXIT_WORDS: &[&str] = &["exit", "quit", "bye", "q"];

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config_path = env::args().nth(1).unwrap_or_else(|| "mnemo.toml".into());
    let cfg = AppConfig::from_env_or_file(&config_path)?;
    cfg.validate()?;

    let log_path = logging::init(&cfg.logging)?;
    info!(config = %config_path, model = %cfg.model.model, user_id = %cfg.memory.user_id, "starting chat session");

    let model = Arc::new(GeminiClient::from_config(&cfg.model)?);
    let registry = tools::standard_toolkit(&cfg.weather)?;
    let store = Mem0Client::from_config(&cfg.memory)?;

    let tool_names = registry.names().join(", ");
    let mut agent = Agent::new(model)
        .with_system_prompt(prompt::SYSTEM_PROMPT)
        .with_tools(registry)
        .with_max_steps(cfg.agent.max_steps)
        .with_context_window(cfg.agent.context_window);

    println!("Chat agent with memory (user: {})", cfg.memory.user_id);
    println!("Tools: {tool_names}");
    println!("Commands: `stats` for session info, `exit`/`quit`/`bye`/`q` to leave.");
    println!("Logging to {}", log_path.display());
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();
    let mut turns = 0usize;

    loop {
        stdout.write_all(b"You: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let input = line.trim();

        if input.is_empty() {
            println!("Please enter a message.\n");
            continue;
        }
        if EXIT_WORDS.contains(&input.to_lowercase().as_str()) {
            println!("Goodbye! This conversation has been saved to memory.");
            break;
        }
        if input.eq_ignore_ascii_case("stats") {
            println!("{turns} conversation turn(s) this session.\n");
            continue;
        }

        info!(turn = turns + 1, "user query received");
        match agent
            .respond_with_recall(&store, &cfg.memory.user_id, input)
            .await
        {
            Ok(reply) => {
                println!("Agent: {reply}\n");
                turns += 1;
                info!(turn = turns, "reply delivered");
            }
            Err(err) => {
                warn!(%err, "turn failed");
                println!("Something went wrong: {err}");
                println!("Please try again, or type `exit` to quit.\n");
            }
        }
    }

    info!(total_turns = turns, "chat session ended");
    Ok(())
}
