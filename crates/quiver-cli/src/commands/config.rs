use anyhow::{bail, Context, Result};
use quiver_client::config::{self, Config};
use toml_edit::{value, DocumentMut};

const TEXT_KEYS: [&str; 4] = [
    "service_url",
    "vectorizer_module",
    "vectorizer_endpoint",
    "vectorizer_model",
];
const TIMEOUT_KEYS: [&str; 2] = ["connect_timeout_secs", "read_timeout_secs"];

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    let path = config::config_file_path();
    println!("Config file: {}", path.display());
    let exists = path.exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    println!("  service_url: {}", config.service_url);
    println!("  vectorizer_module: {}", config.vectorizer_module);
    println!("  vectorizer_endpoint: {}", config.vectorizer_endpoint);
    println!("  vectorizer_model: {}", config.vectorizer_model);
    println!("  connect_timeout_secs: {}", config.connect_timeout_secs);
    println!("  read_timeout_secs: {}", config.read_timeout_secs);

    println!("\nPriority: CLI args > ENV vars (QUIVER_*) > Config file > Defaults");

    Ok(())
}

/// Set a config value.
pub fn set_config(key: &str, new_value: &str) -> Result<()> {
    let config_path = config::config_file_path();
    config::ensure_config_file()?;

    let contents =
        std::fs::read_to_string(&config_path).context("Failed to read config file")?;
    let updated = apply_setting(&contents, key, new_value)?;
    std::fs::write(&config_path, updated).context("Failed to write config file")?;

    println!("✓ Updated {} = {}", key, new_value);
    println!("  in {}", config_path.display());

    Ok(())
}

/// Return `contents` with `key` set to `new_value`, keeping comments and
/// layout intact.
fn apply_setting(contents: &str, key: &str, new_value: &str) -> Result<String> {
    let mut doc = contents
        .parse::<DocumentMut>()
        .context("Config file is not valid TOML")?;

    if TEXT_KEYS.contains(&key) {
        check_text_setting(key, new_value)?;
        doc[key] = value(new_value);
    } else if TIMEOUT_KEYS.contains(&key) {
        let secs: i64 = new_value
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a whole number of seconds"))?;
        if secs <= 0 {
            bail!("{key} must be greater than zero");
        }
        doc[key] = value(secs);
    } else {
        bail!(
            "Unknown config key: {}\n\nValid keys: {}, {}",
            key,
            TEXT_KEYS.join(", "),
            TIMEOUT_KEYS.join(", ")
        );
    }

    Ok(doc.to_string())
}

fn check_text_setting(key: &str, new_value: &str) -> Result<()> {
    let mut candidate = Config::default();
    match key {
        "service_url" => {
            candidate.service_url = new_value.to_string();
            candidate.connection_params()?;
        }
        "vectorizer_module" => candidate.vectorizer_module = new_value.to_string(),
        "vectorizer_endpoint" => candidate.vectorizer_endpoint = new_value.to_string(),
        _ => candidate.vectorizer_model = new_value.to_string(),
    }
    candidate.vectorizer_config()?;
    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure quiver.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
