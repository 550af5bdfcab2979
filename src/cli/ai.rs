use clap::Subcommand;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::output::{self, priority_colored, rule};
use super::App;
use crate::ai::workflow::{self, new_conversation_id};
use crate::ai::{AiCollaborator, GeminiClient};
use crate::config::AiConfig;

#[derive(Subcommand)]
pub enum AiCommand {
    /// Show or update the AI configuration
    Config {
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Ask about a project
    Chat {
        /// Project ID or name
        project: String,
        message: String,
        /// Continue an earlier conversation
        #[arg(long)]
        conversation: Option<String>,
    },
    /// Create a task from a natural-language description
    Add {
        project: String,
        description: String,
    },
    /// Analyze a task
    Analyze { task: String },
    /// Interactive chat about a project
    Interactive { project: String },
}

fn mask(key: &str) -> String {
    let start = key.char_indices().rev().nth(3).map_or(0, |(i, _)| i);
    format!("****{}", &key[start..])
}

pub async fn run(app: &App, command: AiCommand, env_api_key: Option<String>) -> anyhow::Result<()> {
    if let AiCommand::Config { api_key, model } = command {
        return configure(app, api_key, model);
    }

    let config = AiConfig::load(&app.data_dir)?.with_env_fallback(env_api_key);
    let client = GeminiClient::new(config)?;

    match command {
        AiCommand::Config { .. } => Ok(()),
        AiCommand::Chat {
            project,
            message,
            conversation,
        } => {
            let reply = workflow::chat(&app.db, &client, &project, &message, conversation).await?;
            println!("{}", reply.text);
            println!(
                "\n{}",
                format!("conversation: {}", reply.conversation_id).dimmed()
            );
            Ok(())
        }
        AiCommand::Add {
            project,
            description,
        } => add(app, &client, &project, &description).await,
        AiCommand::Analyze { task } => {
            let task = app.db.resolve_task(&task)?;
            let analysis = workflow::analyze_task(&app.db, &client, task.id).await?;
            println!(
                "{}",
                format!(
                    "🧠 AI Analysis for Task [{}]: {}",
                    analysis.task.id, analysis.task.title
                )
                .blue()
            );
            println!("{}", rule(60));
            println!("{}", analysis.insight.content);
            Ok(())
        }
        AiCommand::Interactive { project } => interactive(app, &client, &project).await,
    }
}

fn configure(app: &App, api_key: Option<String>, model: Option<String>) -> anyhow::Result<()> {
    let mut config = AiConfig::load(&app.data_dir)?;
    if api_key.is_none() && model.is_none() {
        println!("Model: {}", config.model);
        println!("Max tokens: {}", config.max_tokens);
        println!("Temperature: {}", config.temperature);
        match config.api_key.as_deref() {
            Some(key) if !key.is_empty() => println!("API key: {}", mask(key)),
            _ => println!("API key: {}", "not set".yellow()),
        }
        return Ok(());
    }

    if let Some(key) = api_key {
        config.api_key = Some(key);
    }
    if let Some(model) = model {
        config.model = model;
    }
    let path = config.save(&app.data_dir)?;
    output::success(format!("AI configuration saved to {}", path.display()));
    Ok(())
}

async fn add(
    app: &App,
    client: &dyn AiCollaborator,
    project: &str,
    description: &str,
) -> anyhow::Result<()> {
    let created = workflow::create_task(&app.db, client, project, description).await?;
    let main = &created.main;

    output::success(format!("Created AI task '{}' (ID: {})", main.title, main.id));
    println!("  Priority: {}", priority_colored(main.priority));
    if let Some(hours) = created.estimated_hours {
        println!("  Estimated: {hours} hours");
    }
    if let Some(complexity) = &main.ai_complexity {
        println!("  Complexity: {complexity}");
    }
    if !created.subtasks.is_empty() {
        println!(
            "{}",
            format!("  Created {} subtasks:", created.subtasks.len()).cyan()
        );
        for sub in &created.subtasks {
            println!("    [{}] {}", sub.id, sub.title);
        }
    }
    Ok(())
}

async fn interactive(
    app: &App,
    client: &dyn AiCollaborator,
    project_ref: &str,
) -> anyhow::Result<()> {
    let project = app.db.resolve_project(project_ref)?;
    let conversation_id = new_conversation_id();

    println!(
        "{}",
        format!("🤖 AI assistant for '{}'", project.name).blue()
    );
    println!("Type a question, 'task: <description>' to create a task, or 'quit' to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => break,
            _ => {}
        }

        let result = match line.strip_prefix("task:") {
            Some(request) => add(app, client, &project.id.to_string(), request.trim()).await,
            None => workflow::chat(
                &app.db,
                client,
                &project.id.to_string(),
                line,
                Some(conversation_id.clone()),
            )
            .await
            .map(|reply| println!("{}", reply.text))
            .map_err(Into::into),
        };
        if let Err(e) = result {
            output::failure(format!("{e:#}"));
        }
    }
    Ok(())
}
