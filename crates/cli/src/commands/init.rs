//! `convoctx init`: print or write the default configuration.

use convoctx_config::ConvoConfig;

pub fn run(write: bool) -> Result<(), Box<dyn std::error::Error>> {
    let default_toml = ConvoConfig::default_toml();
    if !write {
        print!("{default_toml}");
        return Ok(());
    }

    let config_dir = ConvoConfig::config_dir();
    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        tracing::warn!(
            "Config already exists at {}; edit it manually or delete and re-run init",
            config_path.display()
        );
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(&config_path, &default_toml)?;
    tracing::info!("Created config.toml at {}", config_path.display());
    Ok(())
}
