mod error;

pub use error::{Error, Result};

use crate::fetch::{self, Fetcher};
use db::Catalog;
use hyper::Uri;
use lobby::{
    ledger::UserId,
    messenger::{ChannelId, ControlSet, Messenger},
    Lobby, Step, Transition, Warning,
};
use std::sync::Arc;
use twilight_model::{
    application::interaction::{
        application_command::{CommandData, CommandOptionValue},
        Interaction, InteractionData, InteractionType,
    },
    channel::{
        message::{component::ComponentType, embed::EmbedField, Embed, MessageFlags},
        Attachment,
    },
    guild::{PartialMember, Permissions},
    http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType},
    user::User,
};

/// Largest quiz file we are willing to download.
pub const MAX_UPLOAD: usize = 1 << 20;

/// The user behind an interaction, along with what they are allowed to do.
struct Invoker {
    id: UserId,
    permissions: Permissions,
    /// Whether this is the configured bot owner, who bypasses permission checks.
    owner: bool,
}

impl Invoker {
    fn is_administrator(&self) -> bool {
        self.owner || self.permissions.contains(Permissions::ADMINISTRATOR)
    }

    fn can_manage_messages(&self) -> bool {
        self.is_administrator() || self.permissions.contains(Permissions::MANAGE_MESSAGES)
    }
}

enum Command<'a> {
    Start { name: &'a str, multiple: bool },
    Next,
    Upload(Option<&'a Attachment>),
    ForceQuit,
    Help,
}

fn parse_command(data: &CommandData) -> Result<Command<'_>> {
    Ok(match data.name.as_str() {
        "start_quiz" => {
            let mut name = None;
            let mut multiple = false;
            for option in &data.options {
                match (option.name.as_str(), &option.value) {
                    ("name", CommandOptionValue::String(value)) => name = Some(value.as_str()),
                    ("multiple", CommandOptionValue::Boolean(value)) => multiple = *value,
                    _ => return Err(Error::InvalidParams),
                }
            }
            Command::Start { name: name.ok_or(Error::InvalidParams)?, multiple }
        }
        "next_question" => Command::Next,
        "upload_quiz" => {
            let id = data.options.iter().find_map(|option| match (option.name.as_str(), &option.value) {
                ("file", CommandOptionValue::Attachment(id)) => Some(*id),
                _ => None,
            });
            let attachment = id.and_then(|id| data.resolved.as_ref()?.attachments.get(&id));
            Command::Upload(attachment)
        }
        "force_quit" => Command::ForceQuit,
        "help" => Command::Help,
        _ => return Err(Error::UnknownCommandName),
    })
}

fn ephemeral(content: String) -> InteractionResponse {
    InteractionResponse {
        kind: InteractionResponseType::ChannelMessageWithSource,
        data: Some(InteractionResponseData {
            content: Some(content),
            flags: Some(MessageFlags::EPHEMERAL),
            ..Default::default()
        }),
    }
}

fn public(content: String) -> InteractionResponse {
    InteractionResponse {
        kind: InteractionResponseType::ChannelMessageWithSource,
        data: Some(InteractionResponseData { content: Some(content), ..Default::default() }),
    }
}

/// Summarizes a transition for the invoker, appending any soft failures.
fn report(step: Step, warnings: &[Warning]) -> String {
    let mut text = match step {
        Step::Question { number, total } => format!("Question {number} of {total} is now open."),
        Step::Finished => String::from("The quiz has ended!"),
    };
    for warning in warnings {
        text.push('\n');
        text.push_str(&warning.to_string());
    }
    text
}

pub struct Bot<M> {
    lobby: Lobby<M>,
    catalog: Catalog,
    fetcher: Fetcher,
    owner: Option<UserId>,
}

impl<M: Messenger> Bot<M> {
    pub fn new(messenger: Arc<M>, catalog: Catalog, fetcher: Fetcher, owner: Option<UserId>) -> Self {
        Self { lobby: Lobby::new(messenger), catalog, fetcher, owner }
    }

    pub fn lobby(&self) -> &Lobby<M> {
        &self.lobby
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn on_message(&self, interaction: Interaction) -> InteractionResponse {
        let result = match interaction.kind {
            InteractionType::Ping => Ok(InteractionResponse { kind: InteractionResponseType::Pong, data: None }),
            InteractionType::ApplicationCommand => self.on_app_command(interaction).await,
            InteractionType::MessageComponent => self.on_msg_component(interaction).await,
            _ => Err(Error::UnsupportedInteraction),
        };

        let text = match result {
            Ok(res) => return res,
            Err(err) => {
                log::debug!("interaction rejected: {err:?}");
                err.to_string()
            }
        };

        ephemeral(text)
    }

    fn invoker(&self, member: Option<PartialMember>, user: Option<User>) -> Result<Invoker> {
        let permissions = member.as_ref().and_then(|member| member.permissions).unwrap_or_else(Permissions::empty);
        let User { id, .. } = member.and_then(|member| member.user).xor(user).ok_or(Error::UnknownUser)?;
        Ok(Invoker { id, permissions, owner: self.owner == Some(id) })
    }

    async fn on_app_command(&self, interaction: Interaction) -> Result<InteractionResponse> {
        #[allow(deprecated)]
        let Interaction { channel_id, data, member, user, .. } = interaction;

        let invoker = self.invoker(member, user)?;
        let Some(InteractionData::ApplicationCommand(data)) = data else {
            return Err(Error::Fatal);
        };

        let command = parse_command(&data)?;
        if let Command::Help = command {
            return Ok(Self::on_help_command());
        }

        let channel = channel_id.ok_or(Error::UnknownChannel)?;
        self.run(channel, &invoker, command).await
    }

    async fn run(&self, channel: ChannelId, invoker: &Invoker, command: Command<'_>) -> Result<InteractionResponse> {
        match command {
            Command::Start { name, multiple } => self.on_start_command(channel, invoker, name, multiple).await,
            Command::Next => self.on_next_command(channel, invoker).await,
            Command::Upload(attachment) => self.on_upload_command(invoker, attachment).await,
            Command::ForceQuit => self.on_force_quit_command(channel, invoker).await,
            Command::Help => Ok(Self::on_help_command()),
        }
    }

    async fn on_start_command(
        &self,
        channel: ChannelId,
        invoker: &Invoker,
        name: &str,
        multiple: bool,
    ) -> Result<InteractionResponse> {
        if !invoker.is_administrator() {
            return Err(Error::Forbidden("You need administrator permissions to start a quiz."));
        }

        let quiz = self.catalog.get(name).await.ok_or(Error::UnknownQuiz)?;
        let Transition { step, warnings } = self.lobby.start(channel, invoker.id, name, quiz, multiple).await?;
        Ok(ephemeral(format!("Started quiz **{name}**. {}", report(step, &warnings))))
    }

    async fn on_next_command(&self, channel: ChannelId, invoker: &Invoker) -> Result<InteractionResponse> {
        let Transition { step, warnings } = self.lobby.next(channel, invoker.id).await?;
        Ok(ephemeral(report(step, &warnings)))
    }

    async fn on_upload_command(
        &self,
        invoker: &Invoker,
        attachment: Option<&Attachment>,
    ) -> Result<InteractionResponse> {
        if !invoker.is_administrator() {
            return Err(Error::Forbidden("You need administrator permissions to upload quizzes."));
        }

        let attachment = attachment.ok_or(Error::MissingAttachment)?;
        if !fetch::has_json_extension(&attachment.filename) {
            return Err(Error::NotJson);
        }

        if usize::try_from(attachment.size).map_or(true, |size| size > MAX_UPLOAD) {
            return Err(Error::TooLarge);
        }

        let uri: Uri = attachment.url.parse().map_err(|_| Error::UntrustedSource)?;
        if !fetch::is_allowed_uri(&uri) {
            return Err(Error::UntrustedSource);
        }

        let bytes = self.fetcher.get_json(uri, MAX_UPLOAD).await?;
        let names = self.catalog.merge(&bytes).await?;
        log::info!("{} uploaded quizzes {names:?}", invoker.id);
        Ok(ephemeral(format!("Quiz data uploaded and updated successfully! Updated: {}", names.join(", "))))
    }

    async fn on_force_quit_command(&self, channel: ChannelId, invoker: &Invoker) -> Result<InteractionResponse> {
        if !invoker.can_manage_messages() {
            return Err(Error::Forbidden("You do not have permission to force quit quizzes in this channel."));
        }

        let warnings = self.lobby.force_quit(channel).await?;
        let mut text = String::from("All quizzes in this channel have been forcefully ended.");
        for warning in &warnings {
            text.push('\n');
            text.push_str(&warning.to_string());
        }
        Ok(public(text))
    }

    fn on_help_command() -> InteractionResponse {
        let field = |name: &str, value: &str| EmbedField { name: String::from(name), value: String::from(value), inline: false };
        InteractionResponse {
            kind: InteractionResponseType::ChannelMessageWithSource,
            data: Some(InteractionResponseData {
                flags: Some(MessageFlags::EPHEMERAL),
                embeds: Some(Vec::from([Embed {
                    author: None,
                    color: None,
                    footer: None,
                    image: None,
                    provider: None,
                    thumbnail: None,
                    timestamp: None,
                    url: None,
                    video: None,
                    kind: String::from("rich"),
                    title: Some(String::from("Quizboard Commands")),
                    description: Some(String::from("Run multiple-choice quizzes with live vote counts.")),
                    fields: Vec::from([
                        field(
                            "`/start_quiz name [multiple]`",
                            "Start the named quiz in this channel. Set `multiple` to allow several answers per question. Administrators only.",
                        ),
                        field("`/next_question`", "Show the results of the current question and move on. Quiz starter only."),
                        field("`/upload_quiz file`", "Add or replace quizzes from a JSON attachment. Administrators only."),
                        field("`/force_quit`", "End the quiz in this channel without showing results. Requires Manage Messages."),
                        field("`/help`", "Summon this help menu!"),
                    ]),
                }])),
                ..Default::default()
            }),
        }
    }

    async fn on_msg_component(&self, interaction: Interaction) -> Result<InteractionResponse> {
        #[allow(deprecated)]
        let Interaction { channel_id, data, member, user, .. } = interaction;

        let voter = self.invoker(member, user)?.id;
        let channel = channel_id.ok_or(Error::UnknownChannel)?;
        let Some(InteractionData::MessageComponent(data)) = data else {
            return Err(Error::Fatal);
        };

        if data.component_type != ComponentType::Button {
            return Err(Error::UnsupportedInteraction);
        }

        self.on_vote(channel, voter, &data.custom_id).await
    }

    async fn on_vote(&self, channel: ChannelId, voter: UserId, custom_id: &str) -> Result<InteractionResponse> {
        let (origin, label) = ControlSet::parse_id(custom_id).ok_or(Error::Fatal)?;
        let outcome = self.lobby.vote(channel, voter, origin, label).await?;
        Ok(ephemeral(if outcome.is_retraction() {
            format!("❌ Removed vote for **{label}**")
        } else {
            format!("✅ Voted for **{label}**")
        }))
    }
}
