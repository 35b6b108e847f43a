use crate::config::default_config_path;
use crate::config::generate::generate_starter_config;
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn init(stdout: bool, out: &mut dyn Write) -> Result<(), Box<dyn std::error::Error>> {
    let config_content = generate_starter_config();

    if stdout {
        write!(out, "{}", config_content)?;
        return Ok(());
    }

    let config_path = default_config_path();
    if config_path.exists() {
        return Err(format!(
            "Config file already exists at {}. Remove it first or use --stdout to print the config",
            config_path.display()
        )
        .into());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_path, config_content)?;

    writeln!(out, "Config file written to {}", config_path.display())?;
    Ok(())
}

pub fn validate(config_path: Option<&Path>, out: &mut dyn Write) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path.ok_or("No config file found. Use --config to specify a path.")?;

    writeln!(out, "Validating config file: {}", path.display())?;
    crate::config::load_config(path)?;
    writeln!(out, "✓ Config is valid")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_to_stdout() {
        let mut out = Vec::new();
        init(true, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), generate_starter_config());
    }

    #[test]
    fn test_validate_reports_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yml");
        fs::write(&path, "remote_app_log_dir_suffix: a/b\n").unwrap();

        let mut out = Vec::new();
        assert!(validate(Some(&path), &mut out).is_err());
    }

    #[test]
    fn test_validate_accepts_starter_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yml");
        fs::write(&path, generate_starter_config()).unwrap();

        let mut out = Vec::new();
        validate(Some(&path), &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Config is valid"));
    }
}
