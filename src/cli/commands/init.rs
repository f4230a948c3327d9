//! Init command - first-run setup.

use crate::cli::Output;
use crate::config::Settings;
use console::style;

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Playbook Setup");
    println!();

    // API key
    if std::env::var("OPENAI_API_KEY").is_err() {
        Output::warning("OPENAI_API_KEY environment variable is not set.");
        println!();
        println!("  Playbook needs an OpenAI API key for embeddings and answers.");
        println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
        println!("  {}", style("export OPENAI_API_KEY='sk-...'").green());
        println!();
    } else {
        Output::success("OpenAI API key is configured.");
    }

    // Data directory
    let data_dir = settings.data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        Output::success(&format!("Created data directory: {}", data_dir.display()));
    } else {
        Output::info(&format!("Data directory exists: {}", data_dir.display()));
    }

    // Config file
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else {
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
    }

    println!();
    println!("{}", style("Setup complete!").bold().green());
    println!();
    println!("Next steps:");
    println!(
        "  {} Import transcripts",
        style("playbook import transcripts.json").cyan()
    );
    println!("  {} Build the index", style("playbook ingest").cyan());
    println!(
        "  {} Ask a question",
        style("playbook ask \"<question>\"").cyan()
    );

    Ok(())
}
