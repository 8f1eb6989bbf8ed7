use super::Workspace;
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use review_import_config::Config;
use owo_colors::OwoColorize;

pub async fn run_config(workspace: &Workspace, cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(workspace, output).await,
        ConfigCommands::Init { force } => init_config(workspace, force, output).await,
    }
}

async fn show_config(workspace: &Workspace, output: &Output) -> Result<()> {
    let config = &workspace.config;
    output.data("config", config);

    if !output.is_human() || output.is_quiet() {
        return Ok(());
    }

    if workspace.config_file.exists() {
        println!("\n{} {}", "Config file:".bright_cyan().bold(), workspace.config_file.display());
    } else {
        println!(
            "\n{} {} {}",
            "Config file:".bright_cyan().bold(),
            workspace.config_file.display(),
            "(not found, using defaults)".yellow()
        );
    }
    println!();

    let settings = &config.settings;
    let mut settings_table = section("Review Settings");
    settings_table.add_row(vec![Cell::new("Minimum review length"), Cell::new(settings.min_review_length)]);
    settings_table.add_row(vec![Cell::new("Create user accounts"), Cell::new(settings.create_user_accounts)]);
    settings_table.add_row(vec![
        Cell::new("Default IP address"),
        Cell::new(settings.clone().sanitized().effective_default_ip()),
    ]);
    settings_table.add_row(vec![Cell::new("Auto-approve reviews"), Cell::new(settings.auto_approve_reviews)]);
    settings_table.add_row(vec![Cell::new("Mark as verified"), Cell::new(settings.reviews_are_verified)]);
    output.table(settings_table);

    let mut import_table = section("Import");
    import_table.add_row(vec![Cell::new("Batch size"), Cell::new(config.import.batch_size)]);
    import_table.add_row(vec![
        Cell::new("Session lifetime"),
        Cell::new(format!("{}s", config.import.session_ttl_seconds)),
    ]);
    import_table.add_row(vec![
        Cell::new("Maximum upload size"),
        Cell::new(format!("{} bytes", config.import.max_upload_bytes)),
    ]);
    output.table(import_table);

    let paths = &workspace.paths;
    let mut paths_table = section("Paths");
    paths_table.add_row(vec![Cell::new("Base"), Cell::new(paths.config_dir().display())]);
    paths_table.add_row(vec![Cell::new("Data"), Cell::new(paths.data_dir().display())]);
    paths_table.add_row(vec![Cell::new("Uploads"), Cell::new(paths.upload_dir().display())]);
    paths_table.add_row(vec![Cell::new("Sessions"), Cell::new(paths.session_dir().display())]);
    paths_table.add_row(vec![Cell::new("Record store"), Cell::new(paths.store_file().display())]);
    let log_target = config
        .logging
        .file
        .as_ref()
        .map(|f| f.display().to_string())
        .unwrap_or_else(|| "stderr".to_string());
    paths_table.add_row(vec![Cell::new("Log"), Cell::new(log_target)]);
    output.table(paths_table);

    Ok(())
}

fn section(title: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new(title).fg(Color::Cyan).add_attribute(Attribute::Bold),
        Cell::new(""),
    ]);
    table
}

async fn init_config(workspace: &Workspace, force: bool, output: &Output) -> Result<()> {
    let config_file = &workspace.config_file;
    if config_file.exists() && !force {
        output.warn(format!(
            "Configuration file already exists at {}. Use --force to overwrite it.",
            config_file.display()
        ));
        return Ok(());
    }

    Config::default()
        .save_to_file(config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;
    output.success(format!("Wrote default configuration to {}", config_file.display()));
    Ok(())
}
