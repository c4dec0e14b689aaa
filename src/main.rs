// This is the entry point of the moderation bot.
//
// **Architecture Overview:**
// - `core/` = Report engine (platform-agnostic)
// - `infra/` = Implementations of core traits (databases, APIs)
// - `discord/` = Discord-specific adapters (commands, notifier, enforcer)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::ai::{AiConfig, AiSeverityClassifier};
use crate::core::moderation::{
    EnforcementHandler, KeywordSeverityClassifier, ModerationConfig, ModerationNotifier,
    ModerationService, ModeratorStatsStore, ReportStore, SeverityClassifier,
};
use crate::discord::moderation::{DiscordEnforcer, DiscordNotifier};
use crate::discord::{Data, Error};
use crate::infra::ai::OpenRouterClient;
use crate::infra::moderation::{
    InMemoryModeratorStats, InMemoryReportStore, LogEnforcer, LogNotifier, SqliteModeratorStats,
    SqliteReportStore,
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "data/moderation.db";

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn appeal_window(days: i64) -> Option<chrono::Duration> {
    if days <= 0 {
        return None;
    }
    chrono::Duration::try_days(days)
}

/// Thresholds come from `ModerationConfig::default()`; only the operational
/// knobs are read from the environment.
fn load_config() -> ModerationConfig {
    let mut config = ModerationConfig::default();
    if let Some(secs) = env_parse::<u64>("MODERATION_CLASSIFIER_TIMEOUT_SECS") {
        config.classifier_timeout = Duration::from_secs(secs);
    }
    if let Some(days) = env_parse::<i64>("MODERATION_APPEAL_WINDOW_DAYS") {
        match appeal_window(days) {
            Some(window) => config.appeal_window = window,
            None => tracing::warn!(
                days,
                "MODERATION_APPEAL_WINDOW_DAYS must be a positive number of days, using the default"
            ),
        }
    }
    config
}

/// Report command failures to the invoker instead of leaving the interaction hanging.
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::warn!(
                command = %ctx.command().name,
                user_id = ctx.author().id.get(),
                error = %error,
                "Command failed"
            );
            let reply = poise::CreateReply::default()
                .content(format!("❌ {}", error))
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                tracing::error!("Failed to send error reply: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling error: {}", e);
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    let config = load_config();

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let (store, stats): (Box<dyn ReportStore>, Box<dyn ModeratorStatsStore>) =
        match std::env::var("MODERATION_STORAGE").as_deref() {
            Ok("memory") => {
                tracing::warn!("Using in-memory report storage; reports are lost on restart");
                (
                    Box::new(InMemoryReportStore::new()),
                    Box::new(InMemoryModeratorStats::new()),
                )
            }
            _ => {
                let db_path = std::env::var("MODERATION_DB_PATH")
                    .unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
                let reports = SqliteReportStore::new(&db_path)
                    .await
                    .expect("Failed to initialize SQLite report store");
                let stats = SqliteModeratorStats::new(reports.pool());
                stats
                    .migrate()
                    .await
                    .expect("Failed to migrate moderator stats tables");
                (Box::new(reports), Box::new(stats))
            }
        };

    // Severity classifier: the LLM when a key is configured, keywords otherwise
    let classifier: Box<dyn SeverityClassifier> = match std::env::var("OPENROUTER_API_KEY") {
        Ok(api_key) => {
            let model =
                std::env::var("OPENROUTER_MODEL").unwrap_or_else(|_| AiConfig::default().model);
            tracing::info!(model = %model, "Using AI severity classifier");
            let client = OpenRouterClient::new(api_key, config.classifier_timeout)
                .expect("Failed to create OpenRouter client");
            Box::new(AiSeverityClassifier::new(
                client,
                AiConfig {
                    model,
                    ..AiConfig::default()
                },
            ))
        }
        Err(_) => {
            tracing::info!("OPENROUTER_API_KEY not set, using keyword severity classifier");
            Box::new(KeywordSeverityClassifier::new())
        }
    };

    // The notifier and enforcer talk to Discord outside of any command, so they
    // get their own HTTP client
    let http = Arc::new(serenity::Http::new(&token));

    let notifier: Box<dyn ModerationNotifier> =
        match env_parse::<u64>("MOD_CHANNEL_ID").filter(|id| *id != 0) {
            Some(channel_id) => Box::new(DiscordNotifier::new(Arc::clone(&http), channel_id)),
            None => {
                tracing::warn!("MOD_CHANNEL_ID not set, moderator alerts will only be logged");
                Box::new(LogNotifier)
            }
        };

    let enforcer: Box<dyn EnforcementHandler> =
        if env_parse::<bool>("MODERATION_DRY_RUN").unwrap_or(false) {
            tracing::warn!("MODERATION_DRY_RUN is on, decisions will not be enforced");
            Box::new(LogEnforcer)
        } else {
            Box::new(DiscordEnforcer::new(Arc::clone(&http)))
        };

    let moderation = Arc::new(
        ModerationService::new(store, classifier, stats, config)
        .with_notifier(notifier)
        .with_enforcer(enforcer),
    );

    // Create the data structure that will be shared across all commands
    let data = Data { moderation };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    // Slash commands only; reported messages are fetched over HTTP
    let intents = serenity::GatewayIntents::GUILDS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::reports::report(),
                discord::commands::reports::vote(),
                discord::commands::reports::appeal(),
                discord::commands::reports::report_info(),
                discord::commands::review::modqueue(),
                discord::commands::review::modreport(),
                discord::commands::review::review(),
                discord::commands::review::resolve(),
                discord::commands::review::escalate(),
                discord::commands::review::dismiss(),
                discord::commands::review::appeal_decide(),
                discord::commands::review::verify_evidence(),
                discord::commands::review::modmetrics(),
                discord::commands::review::modstats(),
                discord::commands::review::member_age_group(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                // Guild registration is instant, global can take up to an hour
                match env_parse::<u64>("DISCORD_GUILD_ID").filter(|id| *id != 0) {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?;
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                    }
                }

                tracing::info!("Commands registered, bot is ready");
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appeal_window_rejects_bad_values() {
        assert_eq!(appeal_window(7), Some(chrono::Duration::days(7)));
        assert_eq!(appeal_window(0), None);
        assert_eq!(appeal_window(-3), None);
        assert_eq!(appeal_window(i64::MAX), None);
    }
}
