// Command Line Interface
// Thin glue over the detection and compliance engines; reports go to stdout as JSON

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::TextFragment;
use crate::services::compliance::{analyze_compliance, analyze_policy, load_requirements, summarize_policy};
use crate::services::config_store::{AppConfig, ConfigStore};
use crate::services::detection::{DarkPatternClassifier, DetectionEngine, LlmClassifier};
use crate::services::knowledge::KnowledgeBase;
use crate::services::providers::{get_api_key, ProviderClient};
use crate::services::cancel_signal;

#[derive(Parser, Debug)]
#[command(
    name = "watchdogs",
    about = "Detect dark patterns in UI copy and score privacy policies against regulations",
    version
)]
pub struct Cli {
    /// Configuration directory (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect dark patterns in a JSON array of text fragments
    Detect {
        fragments: PathBuf,
        /// Also consult the external classifier
        #[arg(long)]
        ai: bool,
        /// Rule file replacing the built-in pattern table
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Score a privacy policy against a regulation checklist
    Comply {
        policy: PathBuf,
        #[arg(long)]
        regulation: Option<String>,
        /// Include sections, concerns, readability and vague language
        #[arg(long)]
        insights: bool,
    },
    /// Summarise a privacy policy with the configured chat provider
    Summarize { policy: PathBuf },
    /// Print the resolved checklist for a regulation
    Requirements { regulation: String },
    /// Inspect or edit the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration with API keys redacted
    Show,
    /// Store an API key for a provider
    SetKey { provider: String, key: String },
    /// Remove a provider's stored API key
    DeleteKey { provider: String },
}

fn config_store(config_dir: Option<&Path>) -> Option<ConfigStore> {
    config_dir
        .map(Path::to_path_buf)
        .or_else(ConfigStore::default_config_dir)
        .map(ConfigStore::new)
}

fn load_config(config_dir: Option<&Path>) -> Result<AppConfig> {
    match config_store(config_dir) {
        Some(store) => store
            .load()
            .with_context(|| format!("loading {}", store.config_file().display())),
        None => Ok(AppConfig::default()),
    }
}

fn redacted(mut config: AppConfig) -> AppConfig {
    for key in config.api_keys.values_mut() {
        *key = "********".to_string();
    }
    config
}

fn run_config(store: &ConfigStore, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = store
                .load()
                .with_context(|| format!("loading {}", store.config_file().display()))?;
            print_json(&redacted(config))
        }
        ConfigAction::SetKey { provider, key } => {
            store
                .set_api_key(provider, key.trim())
                .with_context(|| format!("saving {}", store.config_file().display()))?;
            info!("[cli] Stored API key for {}", provider);
            Ok(())
        }
        ConfigAction::DeleteKey { provider } => {
            store
                .delete_api_key(provider)
                .with_context(|| format!("saving {}", store.config_file().display()))?;
            info!("[cli] Removed API key for {}", provider);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

async fn run_detect(config: &AppConfig, fragments_path: &Path, ai: bool, rules: Option<&Path>) -> Result<()> {
    let fragments: Vec<TextFragment> = serde_json::from_str(&read_text(fragments_path)?)
        .with_context(|| format!("parsing fragments from {}", fragments_path.display()))?;

    let knowledge = match rules {
        Some(path) => KnowledgeBase::from_json_file(path)
            .with_context(|| format!("loading rules from {}", path.display()))?,
        None => KnowledgeBase::builtin().context("loading built-in rules")?,
    };
    let engine = DetectionEngine::from_config(Arc::new(knowledge), &config.detection);

    let classifier = if ai || config.detection.use_external_classifier {
        Some(LlmClassifier::from_config(config).context("configuring external classifier")?)
    } else {
        None
    };

    let (handle, signal) = cancel_signal();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("[cli] Interrupted, abandoning outstanding classifier batches");
            handle.cancel();
        }
    });

    let report = engine
        .detect(
            &fragments,
            classifier.as_ref().map(|c| c as &dyn DarkPatternClassifier),
            &signal,
        )
        .await;
    watcher.abort();

    print_json(&report)
}

fn run_comply(config: &AppConfig, policy: &Path, regulation: Option<&str>, insights: bool) -> Result<()> {
    let text = read_text(policy)?;
    let regulation = regulation.unwrap_or(&config.compliance.default_regulation);

    let report = analyze_compliance(&text, regulation, config.compliance.requirements_dir.as_deref())
        .with_context(|| format!("analyzing {}", policy.display()))?;

    if insights {
        print_json(&serde_json::json!({
            "report": report,
            "insights": analyze_policy(&text),
        }))
    } else {
        print_json(&report)
    }
}

async fn run_summarize(config: &AppConfig, policy: &Path) -> Result<()> {
    let text = read_text(policy)?;
    let provider = config.classifier.provider.as_str();
    let api_key = get_api_key(provider)
        .or_else(|| config.api_keys.get(provider).cloned())
        .with_context(|| format!("no API key configured for {}", provider))?;

    let client = match config.active_proxy() {
        Some(proxy) => ProviderClient::with_proxy(proxy)?,
        None => ProviderClient::new(),
    };
    let summary = summarize_policy(&client, &config.classifier, &api_key, &text).await?;
    print_json(&summary)
}

pub async fn execute(cli: Cli) -> Result<()> {
    let config_dir = cli.config_dir.as_deref();

    if let Command::Config { action } = &cli.command {
        let store = config_store(config_dir).context("no configuration directory available")?;
        return run_config(&store, action);
    }

    let config = load_config(config_dir)?;
    info!("[cli] Running {:?}", cli.command);

    match &cli.command {
        Command::Detect { fragments, ai, rules } => {
            run_detect(&config, fragments, *ai, rules.as_deref()).await
        }
        Command::Comply {
            policy,
            regulation,
            insights,
        } => run_comply(&config, policy, regulation.as_deref(), *insights),
        Command::Summarize { policy } => run_summarize(&config, policy).await,
        Command::Requirements { regulation } => print_json(&load_requirements(
            regulation,
            config.compliance.requirements_dir.as_deref(),
        )),
        Command::Config { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_detect() {
        let cli = Cli::try_parse_from(["watchdogs", "detect", "page.json", "--ai"]).unwrap();
        match cli.command {
            Command::Detect { fragments, ai, rules } => {
                assert_eq!(fragments, PathBuf::from("page.json"));
                assert!(ai);
                assert!(rules.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_comply_with_regulation() {
        let cli = Cli::try_parse_from(["watchdogs", "comply", "policy.txt", "--regulation", "ccpa", "--insights"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Comply { ref regulation, insights: true, .. } if regulation.as_deref() == Some("ccpa")
        ));
    }

    #[test]
    fn test_load_config_missing_dir_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(dir.path())).unwrap();
        assert_eq!(config.detection.batch_size, 20);
    }

    #[test]
    fn test_parse_config_set_key() {
        let cli = Cli::try_parse_from(["watchdogs", "config", "set-key", "groq", "gsk_test"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config { action: ConfigAction::SetKey { ref provider, ref key } }
                if provider == "groq" && key == "gsk_test"
        ));
    }

    #[test]
    fn test_config_set_and_delete_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = config_store(Some(dir.path())).unwrap();

        run_config(&store, &ConfigAction::SetKey {
            provider: "groq".to_string(),
            key: " gsk_test ".to_string(),
        })
        .unwrap();
        assert_eq!(store.get_api_key("groq").unwrap().as_deref(), Some("gsk_test"));
        assert_eq!(load_config(Some(dir.path())).unwrap().api_keys["groq"], "gsk_test");

        run_config(&store, &ConfigAction::DeleteKey {
            provider: "groq".to_string(),
        })
        .unwrap();
        assert!(store.get_api_key("groq").unwrap().is_none());
        assert!(dir.path().join("backups").is_dir());
    }

    #[test]
    fn test_redacted_hides_keys() {
        let mut config = AppConfig::default();
        config.api_keys.insert("groq".to_string(), "gsk_secret".to_string());
        assert_eq!(redacted(config).api_keys["groq"], "********");
    }
}
