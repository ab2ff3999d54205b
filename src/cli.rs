use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use stubby::{Registry, RegistryError};

/// One line typed into the shell
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
pub struct Line {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Shorten a URL
    Create {
        url: String,
        /// Custom short code (3-20 letters or digits)
        #[arg(long)]
        code: Option<String>,
        /// Minutes until the short URL expires
        #[arg(long)]
        minutes: Option<i64>,
    },
    /// Resolve a short code, counting a click
    Resolve {
        code: String,
        #[arg(long)]
        referrer: Option<String>,
    },
    /// Show one short URL without counting a click
    Get { code: String },
    /// Delete a short URL
    Delete { code: String },
    /// List all short URLs, newest first
    List,
    /// Registry-wide totals
    Stats,
    /// Most clicked short URLs
    Top {
        #[arg(default_value_t = 5)]
        n: usize,
    },
    /// Latest clicks on a short URL
    Recent {
        code: String,
        #[arg(default_value_t = 5)]
        k: usize,
    },
    /// Clicks per referrer for a short URL
    Referrers { code: String },
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Run a parsed command; `None` means the shell should stop
pub async fn execute(registry: &Registry, command: Command) -> Option<Value> {
    let result = match command {
        Command::Create { url, code, minutes } => registry
            .create_short_url(&url, code.as_deref(), minutes)
            .await
            .map(|view| json!(view)),
        Command::Resolve { code, referrer } => registry
            .resolve(&code, referrer.as_deref())
            .await
            .map(|url| json!({ "redirect_to": url })),
        Command::Get { code } => registry.lookup(&code).await.map(|view| json!(view)),
        Command::Delete { code } => registry
            .delete_short_url(&code)
            .await
            .map(|()| json!({ "deleted": code })),
        Command::List => registry.list_all().await.map(|views| json!(views)),
        Command::Stats => registry.stats().await.map(|stats| json!(stats)),
        Command::Top { n } => registry.top_performers(n).await.map(|views| json!(views)),
        Command::Recent { code, k } => registry
            .recent_activity(&code, k)
            .await
            .map(|clicks| json!(clicks)),
        Command::Referrers { code } => registry
            .referrer_breakdown(&code)
            .await
            .map(|counts| {
                json!(counts
                    .into_iter()
                    .map(|(referrer, clicks)| json!({ "referrer": referrer, "clicks": clicks }))
                    .collect::<Vec<_>>())
            }),
        Command::Quit => return None,
    };

    Some(result.unwrap_or_else(|e| error_json(&e)))
}

fn error_json(err: &RegistryError) -> Value {
    json!({ "error": err.kind(), "message": err.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubby::config::RegistryConfig;

    fn parse(line: &str) -> Command {
        Line::try_parse_from(line.split_whitespace())
            .unwrap()
            .command
    }

    #[test]
    fn parses_create_with_options() {
        match parse("create https://example.com --code abc --minutes 5") {
            Command::Create { url, code, minutes } => {
                assert_eq!(url, "https://example.com");
                assert_eq!(code.as_deref(), Some("abc"));
                assert_eq!(minutes, Some(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn exit_is_quit() {
        assert!(matches!(parse("exit"), Command::Quit));
    }

    #[tokio::test]
    async fn errors_are_reported_as_json() {
        let registry = Registry::in_memory(RegistryConfig::default());
        let output = execute(&registry, parse("resolve missing")).await.unwrap();
        assert_eq!(output["error"], "NotFound");
    }

    #[tokio::test]
    async fn create_then_resolve() {
        let registry = Registry::in_memory(RegistryConfig::default());
        let created = execute(&registry, parse("create https://example.com/page --code page"))
            .await
            .unwrap();
        assert_eq!(created["short_url"], "http://localhost:3000/page");

        let resolved = execute(&registry, parse("resolve page --referrer mail"))
            .await
            .unwrap();
        assert_eq!(resolved["redirect_to"], "https://example.com/page");
    }
}
