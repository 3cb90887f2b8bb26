use anyhow::Context;
use api::interaction::{self, PublicKey};
use std::{env, path::PathBuf};
use twilight_model::id::{
    marker::{ApplicationMarker, GuildMarker, UserMarker},
    Id,
};

/// Where quizzes are persisted when `QUIZ_DATA` is unset.
const DEFAULT_QUIZ_DATA: &str = "quiz_data.json";

pub struct Config {
    pub port: u16,
    pub app: Id<ApplicationMarker>,
    pub token: String,
    pub public_key: PublicKey,
    pub quiz_data: PathBuf,
    /// Bypasses the permission checks on every command.
    pub owner: Option<Id<UserMarker>>,
    /// Registers the commands for a single guild instead of globally.
    pub guild: Option<Id<GuildMarker>>,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("missing environment variable {key}"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = required("PORT")?.parse().context("PORT must be a port number")?;
        let app = required("APP_ID")?.parse().context("APP_ID must be a snowflake")?;
        let token = required("TOKEN")?;
        let public_key = interaction::parse_public_key(&required("PUBLIC_KEY")?)
            .context("PUBLIC_KEY must be a hex-encoded Ed25519 public key")?;
        let quiz_data = optional("QUIZ_DATA").unwrap_or_else(|| String::from(DEFAULT_QUIZ_DATA)).into();
        let owner = optional("OWNER_ID").map(|id| id.parse()).transpose().context("OWNER_ID must be a snowflake")?;
        let guild = optional("GUILD_ID").map(|id| id.parse()).transpose().context("GUILD_ID must be a snowflake")?;
        Ok(Self { port, app, token, public_key, quiz_data, owner, guild })
    }
}
