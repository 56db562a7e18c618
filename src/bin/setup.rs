//! Emojibot setup wizard.
//!
//! Asks for credentials, the channels to watch, and the model, then writes a
//! commented `config.toml` into the project root (`EMOJIBOT_ROOT`, default cwd).

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;

struct ConfigParams<'a> {
    bot_token: &'a str,
    client_id: &'a str,
    api_key: &'a str,
    model: &'a str,
    channels: &'a str,
    check_tone: bool,
}

/// Produces a valid config.toml string. Extracted so it can be unit-tested.
fn format_config(p: &ConfigParams<'_>) -> String {
    let ids: Vec<&str> = p
        .channels
        .split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let ids_str = ids.join(", ");

    let client_line = if p.client_id.is_empty() {
        "# client_id = 123456789012345678".to_owned()
    } else {
        format!("client_id = {}", p.client_id)
    };

    let bot_token = p.bot_token;
    let api_key = p.api_key;
    let model = p.model;
    let check_tone = p.check_tone;

    format!(
        r#"bot_token = "{bot_token}"
openai_api_key = "{api_key}"
{client_line}

model = "{model}"
# tone_model = "gpt-4o-mini"
# base_url = "https://api.openai.com/v1"
system_prompt = """You react to chat messages with a single emoji. \
Reply with exactly one emoji that fits the message and nothing else."""

whitelisted_channels = [{ids_str}]

ignore_bots = true
ignore_links_only = true
check_tone_appropriateness = {check_tone}
# extraction_mode = "strict"   # or "permissive"
# link_residue_min = 3
# max_images = 3
# request_timeout_secs = 30

log_level = "INFO"
"#
    )
}

fn main() -> Result<()> {
    let project_root =
        PathBuf::from(std::env::var("EMOJIBOT_ROOT").unwrap_or_else(|_| ".".to_string()));

    println!("=== Emojibot Setup ===\n");

    let read_line = |prompt: &str| -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_owned())
    };

    let or_default = |s: String, default: &str| {
        if s.is_empty() {
            default.to_owned()
        } else {
            s
        }
    };

    let bot_token = read_line("Discord bot token: ")?;
    let client_id = read_line("Discord application ID (optional, for the invite URL): ")?;
    let api_key = read_line("OpenAI API key: ")?;
    let model = or_default(read_line("Model [gpt-4o-mini]: ")?, "gpt-4o-mini");
    let channels = read_line("Channel IDs to react in (comma-separated): ")?;
    let check_tone = !read_line("Check tone before reacting? [Y/n]: ")?
        .to_lowercase()
        .starts_with('n');

    let config = format_config(&ConfigParams {
        bot_token: &bot_token,
        client_id: &client_id,
        api_key: &api_key,
        model: &model,
        channels: &channels,
        check_tone,
    });

    let config_path = project_root.join("config.toml");
    std::fs::write(&config_path, &config)
        .with_context(|| format!("Could not write {}", config_path.display()))?;

    println!("\n✓  config.toml saved to {}", config_path.display());
    println!("   Run the bot with:  cargo run --bin emojibot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(client_id: &str, channels: &str, check_tone: bool) -> String {
        format_config(&ConfigParams {
            bot_token: "discord-token",
            client_id,
            api_key: "sk-abc",
            model: "gpt-4o",
            channels,
            check_tone,
        })
    }

    #[test]
    fn test_credentials_present() {
        let out = cfg("", "1", true);
        assert!(out.contains(r#"bot_token = "discord-token""#));
        assert!(out.contains(r#"openai_api_key = "sk-abc""#));
        assert!(out.contains(r#"model = "gpt-4o""#));
    }

    #[test]
    fn test_client_id_commented_when_empty() {
        let out = cfg("", "1", true);
        assert!(out.contains("# client_id ="));
        assert!(!out.contains("\nclient_id = "));

        let out = cfg("42", "1", true);
        assert!(out.contains("\nclient_id = 42"));
    }

    #[test]
    fn test_channels_normalized() {
        let out = cfg("", "111, 222 333", true);
        assert!(out.contains("whitelisted_channels = [111, 222, 333]"));
    }

    #[test]
    fn test_tone_toggle() {
        assert!(cfg("", "1", false).contains("check_tone_appropriateness = false"));
        assert!(cfg("", "1", true).contains("check_tone_appropriateness = true"));
    }

    #[test]
    fn test_output_is_valid_toml() {
        let parsed: toml::Value = toml::from_str(&cfg("42", "111, 222", true)).unwrap();
        assert_eq!(parsed["whitelisted_channels"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["client_id"].as_integer(), Some(42));
    }
}
