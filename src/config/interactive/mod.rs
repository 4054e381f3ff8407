use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};

use super::{Config, get_config_dir};
use crate::embeddings::ollama::OllamaClient;

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("Recall Configuration Setup").bold().cyan());
    eprintln!();

    let config_dir = get_config_dir().context("Failed to resolve config directory")?;
    let mut config = Config::load(&config_dir).context("Failed to load existing configuration")?;

    config.owner_id = Input::new()
        .with_prompt("Owner id for records created by this CLI")
        .default(config.owner_id.clone())
        .interact_text()?;

    eprintln!();
    eprintln!("{}", style("Embedding Endpoint (Ollama)").bold().yellow());

    config.ollama.host = Input::new()
        .with_prompt("Ollama host")
        .default(config.ollama.host.clone())
        .interact_text()?;
    config.ollama.port = Input::new()
        .with_prompt("Ollama port")
        .default(config.ollama.port)
        .interact_text()?;
    config.ollama.model = Input::new()
        .with_prompt("Embedding model")
        .default(config.ollama.model.clone())
        .interact_text()?;

    eprintln!();
    eprintln!("{}", style("Language Model Endpoint").bold().yellow());
    eprintln!("Used for re-ranking, summaries, and question answering.");

    config.llm.enabled = Confirm::new()
        .with_prompt("Enable language model features?")
        .default(config.llm.enabled)
        .interact()?;

    if config.llm.enabled {
        config.llm.host = Input::new()
            .with_prompt("Language model host")
            .default(config.llm.host.clone())
            .interact_text()?;
        config.llm.port = Input::new()
            .with_prompt("Language model port")
            .default(config.llm.port)
            .interact_text()?;
        config.llm.model = Input::new()
            .with_prompt("Completion model")
            .default(config.llm.model.clone())
            .interact_text()?;
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    eprintln!();
    eprintln!("{}", style("Testing embedding endpoint...").yellow());

    match OllamaClient::new(&config.ollama).and_then(|client| client.ping()) {
        Ok(()) => eprintln!("{}", style("✓ Embedding endpoint reachable").green()),
        Err(e) => {
            eprintln!(
                "{}",
                style(format!("⚠ Could not reach embedding endpoint: {}", e)).yellow()
            );
            eprintln!("You can continue, but make sure Ollama is running before indexing.");
        }
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config_dir = get_config_dir().context("Failed to resolve config directory")?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    println!("Configuration file: {}", config.config_file_path().display());
    println!();
    println!("Owner id: {}", config.owner_id);
    println!(
        "Embedding endpoint: {}://{}:{} (model: {}, {} dimensions)",
        config.ollama.protocol,
        config.ollama.host,
        config.ollama.port,
        config.ollama.model,
        config.ollama.embedding_dimension
    );
    if config.llm.enabled {
        println!(
            "Language model: {}://{}:{} (model: {})",
            config.llm.protocol, config.llm.host, config.llm.port, config.llm.model
        );
    } else {
        println!("Language model: disabled");
    }
    println!(
        "Search: overfetch x{}, default limit {}, semantic weight {}",
        config.search.overfetch_factor, config.search.default_limit, config.search.semantic_weight
    );

    Ok(())
}
