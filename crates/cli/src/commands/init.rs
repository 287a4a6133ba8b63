//! `docsmith init` — scaffold the config file and project context.

use docsmith_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if config_path.exists() {
        println!("  Config already exists: {}", config_path.display());
    } else {
        tokio::fs::create_dir_all(&config_dir).await?;
        tokio::fs::write(&config_path, AppConfig::default_toml()).await?;
        println!("  Wrote starter config: {}", config_path.display());
    }

    // A per-project context directory; documentation notes the assistant
    // should always see can live here.
    let project_dir = std::env::current_dir()?.join(".docsmith");
    if project_dir.is_dir() {
        println!("  Project context already exists: {}", project_dir.display());
    } else {
        tokio::fs::create_dir_all(&project_dir).await?;
        let notes = project_dir.join("NOTES.md");
        tokio::fs::write(
            &notes,
            "# Project notes\n\nFacts the documentation assistant should know about this project.\n",
        )
        .await?;
        println!("  Created project context: {}", project_dir.display());
    }

    println!();
    println!("  Next steps:");
    println!("    1. Put your API key in the config file or DOCSMITH_API_KEY");
    println!("    2. Run `docsmith chat` in your project directory");
    println!();
    Ok(())
}
