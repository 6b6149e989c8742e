use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use stijnbot_core::clock::Clock;
use stijnbot_core::config::{BotConfig, MAX_BOT_WINDOW_SECS};
use stijnbot_core::dialogue::{DialogueAction, DialogueEvent, DialogueKind};
use stijnbot_core::domain::user::UserId;
use stijnbot_core::replies;
use stijnbot_core::router::{Command, CommandRouter, MessageScope, RouterError};
use stijnbot_core::survey::{tally_team, SurveyGate};
use stijnbot_core::uptime::format_uptime;
use stijnbot_db::UserRepository;

use crate::api::{BotIdentity, SlackApi};
use crate::events::{EventContext, EventHandlerError, HandlerResult, MessageEvent, MessageService};
use crate::session::{ActiveDialogue, BotSession, DialogueKey};
use crate::shutdown::ShutdownSignal;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponderSettings {
    pub bot_user_id: String,
    pub bot_name: String,
    pub hostname: String,
    pub survey_threshold_secs: i64,
    pub shutdown_delay: Duration,
    pub dialogue_timeout_secs: i64,
}

impl ResponderSettings {
    pub fn new(config: &BotConfig, identity: &BotIdentity, hostname: impl Into<String>) -> Self {
        let bot_name =
            if identity.name.trim().is_empty() { config.name.clone() } else { identity.name.clone() };
        Self {
            bot_user_id: identity.user_id.clone(),
            bot_name,
            hostname: hostname.into(),
            survey_threshold_secs: config.survey_threshold_secs,
            shutdown_delay: Duration::from_secs(config.shutdown_delay_secs),
            dialogue_timeout_secs: config.dialogue_timeout_secs,
        }
    }
}

pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "an unknown host".to_owned())
}

/// Turns inbound messages into replies, dialogue turns and record updates.
pub struct Responder {
    api: Arc<dyn SlackApi>,
    users: Arc<dyn UserRepository>,
    session: Arc<BotSession>,
    clock: Arc<dyn Clock>,
    shutdown: ShutdownSignal,
    router: CommandRouter,
    survey_gate: SurveyGate,
    dialogue_timeout: chrono::Duration,
    settings: ResponderSettings,
}

impl Responder {
    pub fn new(
        api: Arc<dyn SlackApi>,
        users: Arc<dyn UserRepository>,
        session: Arc<BotSession>,
        clock: Arc<dyn Clock>,
        shutdown: ShutdownSignal,
        settings: ResponderSettings,
    ) -> Result<Self, RouterError> {
        Ok(Self {
            api,
            users,
            session,
            clock,
            shutdown,
            router: CommandRouter::new()?,
            survey_gate: SurveyGate::new(settings.survey_threshold_secs),
            dialogue_timeout: chrono::Duration::seconds(
                settings.dialogue_timeout_secs.clamp(1, MAX_BOT_WINDOW_SECS),
            ),
            settings,
        })
    }

    pub fn session(&self) -> &Arc<BotSession> {
        &self.session
    }

    pub fn settings(&self) -> &ResponderSettings {
        &self.settings
    }

    /// Ends every dialogue that has been idle past the timeout. Returns how many ended.
    pub async fn expire_idle_dialogues(&self) -> Result<usize, EventHandlerError> {
        let expired =
            self.session.take_expired_dialogues(self.clock.now(), self.dialogue_timeout).await;
        let count = expired.len();

        for (key, dialogue) in expired {
            self.time_out(&key, dialogue).await?;
        }

        Ok(count)
    }

    async fn time_out(
        &self,
        key: &DialogueKey,
        dialogue: ActiveDialogue,
    ) -> Result<(), EventHandlerError> {
        let outcome = dialogue.engine.apply(&dialogue.state, &DialogueEvent::TimedOut)?;
        info!(
            event_name = "bot.dialogue.expired",
            dialogue = dialogue.kind().label(),
            channel_id = %key.channel_id,
            user_id = %key.user_id,
            "dialogue expired without an answer"
        );
        self.run_actions(key, &outcome.actions).await?;
        Ok(())
    }

    async fn say(&self, channel_id: &str, text: &str) -> Result<(), EventHandlerError> {
        self.api.post_message(channel_id, text).await?;
        Ok(())
    }

    /// Reactions are decoration; a failed one must not block the reply.
    async fn react(&self, event: &MessageEvent, name: &str, ctx: &EventContext) {
        if let Err(error) = self.api.add_reaction(&event.channel_id, &event.ts, name).await {
            warn!(
                event_name = "bot.reaction.failed",
                correlation_id = %ctx.correlation_id,
                channel_id = %event.channel_id,
                reaction = name,
                error = %error,
                "failed to add emoji reaction"
            );
        }
    }

    async fn run_actions(
        &self,
        key: &DialogueKey,
        actions: &[DialogueAction],
    ) -> Result<bool, EventHandlerError> {
        let mut replied = false;

        for action in actions {
            match action {
                DialogueAction::Say(text) => {
                    self.say(&key.channel_id, text).await?;
                    replied = true;
                }
                DialogueAction::PersistNickname(name) => {
                    self.save_nickname(&key.user_id, name).await?;
                    self.say(&key.channel_id, &replies::nickname_saved(name)).await?;
                    replied = true;
                }
                DialogueAction::PersistHappiness(blij) => {
                    let mut record = self.users.find_or_default(&key.user_id).await?;
                    record.record_happiness(*blij, self.clock.now());
                    self.users.save(record).await?;
                    info!(
                        event_name = "bot.survey.answered",
                        user_id = %key.user_id,
                        blij = *blij,
                        "recorded happiness answer"
                    );
                }
                DialogueAction::ScheduleShutdown => {
                    info!(
                        event_name = "bot.shutdown.scheduled",
                        user_id = %key.user_id,
                        delay_ms = self.settings.shutdown_delay.as_millis() as u64,
                        "shutdown confirmed"
                    );
                    let _timer = self.shutdown.schedule(self.settings.shutdown_delay);
                }
            }
        }

        Ok(replied)
    }

    async fn save_nickname(&self, user_id: &UserId, name: &str) -> Result<(), EventHandlerError> {
        let record = self.users.find_or_default(user_id).await?.with_name(name);
        self.users.save(record).await?;
        Ok(())
    }

    async fn open_dialogue(
        &self,
        key: DialogueKey,
        kind: DialogueKind,
    ) -> Result<HandlerResult, EventHandlerError> {
        let dialogue = ActiveDialogue::open(kind, self.clock.now());
        let opening = dialogue.engine.opening();
        debug!(
            event_name = "bot.dialogue.opened",
            dialogue = kind.label(),
            channel_id = %key.channel_id,
            user_id = %key.user_id,
            "opening dialogue"
        );
        self.session.open_dialogue(key.clone(), dialogue).await;
        let replied = self.run_actions(&key, &opening).await?;
        Ok(if replied { HandlerResult::Responded } else { HandlerResult::Processed })
    }

    /// Feeds `text` to the dialogue open under `key`, if any.
    async fn continue_dialogue(
        &self,
        key: &DialogueKey,
        text: &str,
    ) -> Result<Option<HandlerResult>, EventHandlerError> {
        let Some(mut dialogue) = self.session.take_dialogue(key).await else {
            return Ok(None);
        };

        let now = self.clock.now();
        if dialogue.is_expired(now, self.dialogue_timeout) {
            self.time_out(key, dialogue).await?;
            return Ok(None);
        }

        let outcome = dialogue.engine.apply(&dialogue.state, &DialogueEvent::Answered(text.into()))?;
        debug!(
            event_name = "bot.dialogue.advanced",
            dialogue = dialogue.kind().label(),
            from = ?outcome.from,
            to = ?outcome.to,
            user_id = %key.user_id,
            "dialogue advanced"
        );

        if !outcome.to.is_terminal() {
            dialogue.state = outcome.to.clone();
            dialogue.last_activity = now;
            self.session.open_dialogue(key.clone(), dialogue).await;
        }

        let replied = self.run_actions(key, &outcome.actions).await?;
        Ok(Some(if replied { HandlerResult::Responded } else { HandlerResult::Processed }))
    }

    async fn run_command(
        &self,
        command: Command,
        event: &MessageEvent,
        user_id: &UserId,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let channel_id = event.channel_id.as_str();
        info!(
            event_name = "bot.command.routed",
            correlation_id = %ctx.correlation_id,
            command = ?command.kind(),
            channel_id,
            user_id = %user_id,
            "routed command"
        );

        match command {
            Command::Greet => {
                self.react(event, replies::GREETING_REACTION, ctx).await;
                let record = self.users.find_by_id(user_id).await?;
                let name = record.as_ref().and_then(|record| record.display_name());
                self.say(channel_id, &replies::hello(name)).await?;
            }
            Command::SetNickname { name } => {
                self.save_nickname(user_id, &name).await?;
                self.say(channel_id, &replies::nickname_saved(&name)).await?;
            }
            Command::WhoAmI => {
                let record = self.users.find_by_id(user_id).await?;
                match record.as_ref().and_then(|record| record.display_name()) {
                    Some(name) => self.say(channel_id, &replies::your_name_is(name)).await?,
                    None => {
                        let key = DialogueKey::new(channel_id, user_id.clone());
                        return self.open_dialogue(key, DialogueKind::Nickname).await;
                    }
                }
            }
            Command::Shutdown => {
                let key = DialogueKey::new(channel_id, user_id.clone());
                return self.open_dialogue(key, DialogueKind::Shutdown).await;
            }
            Command::Identify => {
                let uptime = format_uptime(self.session.uptime());
                let reply =
                    replies::identity(&self.settings.bot_name, &uptime, &self.settings.hostname);
                self.say(channel_id, &reply).await?;
            }
            Command::NotHappy => {
                self.react(event, replies::NOT_HAPPY_REACTION, ctx).await;
                let record = self.users.find_by_id(user_id).await?;
                let name = record.as_ref().and_then(|record| record.display_name());
                self.say(channel_id, &replies::not_happy(name)).await?;
            }
            Command::WasIHappy => {
                let record = self.users.find_by_id(user_id).await?;
                let reply = match record.and_then(|record| record.blij) {
                    Some(blij) => replies::was_happy(blij),
                    None => replies::HAPPINESS_UNKNOWN.to_owned(),
                };
                self.say(channel_id, &reply).await?;
            }
            Command::TeamHappiness => {
                let records = self.users.all().await?;
                let tally = tally_team(&records, self.session.member_count());
                let reply = replies::team_happiness(tally.happy, tally.unhappy, tally.unknown);
                self.say(channel_id, &reply).await?;
            }
        }

        Ok(HandlerResult::Responded)
    }

    async fn survey_ambient(
        &self,
        user_id: &UserId,
        seen: u64,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let record = self.users.find_or_default(user_id).await?;
        let now = self.clock.now();

        if !self.session.claim_survey_prompt(&record, &self.survey_gate, now).await {
            debug!(
                event_name = "bot.survey.skipped",
                correlation_id = %ctx.correlation_id,
                user_id = %user_id,
                ambient_messages = seen,
                "survey prompt not due"
            );
            return Ok(HandlerResult::Processed);
        }

        let direct_channel = self.api.open_direct_channel(user_id.as_str()).await?;
        info!(
            event_name = "bot.survey.prompted",
            correlation_id = %ctx.correlation_id,
            user_id = %user_id,
            ambient_messages = seen,
            "asking user whether they are happy"
        );
        let key = DialogueKey::new(direct_channel, user_id.clone());
        self.open_dialogue(key, DialogueKind::HappinessSurvey).await
    }
}

#[async_trait]
impl MessageService for Responder {
    async fn handle_message(
        &self,
        event: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        if event.is_from(&self.settings.bot_user_id) {
            return Ok(HandlerResult::Ignored);
        }

        let user_id = UserId::new(event.user_id.clone());
        let scoped = event.scoped_text(&self.settings.bot_user_id);
        let key = DialogueKey::new(event.channel_id.clone(), user_id.clone());
        debug!(
            event_name = "bot.message.received",
            correlation_id = %ctx.correlation_id,
            channel_id = %event.channel_id,
            user_id = %user_id,
            scope = scoped.scope.label(),
            "classified inbound message"
        );

        // Every ambient message counts, including answers to an open dialogue.
        let ambient_seen = (scoped.scope == MessageScope::Ambient)
            .then(|| self.session.record_ambient_message());

        if let Some(result) = self.continue_dialogue(&key, &scoped.text).await? {
            return Ok(result);
        }

        if let Some(command) = self.router.route(&scoped.text, scoped.scope) {
            return self.run_command(command, event, &user_id, ctx).await;
        }

        match ambient_seen {
            Some(seen) => self.survey_ambient(&user_id, seen, ctx).await,
            None => Ok(HandlerResult::Ignored),
        }
    }
}
