//! Serenity-backed [`Directory`] and [`Transport`].
//!
//! Lookups read serenity's cache. Channels this process created or deleted are
//! tracked in a small overlay until the gateway catches up, so a room created
//! a moment ago is already visible to the identifier that asked for it.

use crate::convert::{
    channel_info, create_embed, online_status, serenity_channel_kind, user_info,
};
use async_trait::async_trait;
use herald_core::{
    ChannelId, ChannelInfo, Directory, GuildId, GuildInfo, NewChannel, Outbound,
    SendTarget, Status, Transport, TypingGuard, UserId, UserInfo,
};
use herald_error::{TransportError, TransportResult};
use parking_lot::RwLock;
use serenity::all::{
    ActivityData, Cache, ChannelId as SerenityChannelId, CreateAttachment, CreateChannel,
    CreateMessage, GuildChannel, GuildId as SerenityGuildId, Http, PermissionOverwrite,
    PermissionOverwriteType, Permissions, ShardManager, UserId as SerenityUserId,
};
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU64;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

fn serenity_user(id: UserId) -> Option<SerenityUserId> {
    NonZeroU64::new(id.0).map(SerenityUserId::from)
}

fn serenity_channel(id: ChannelId) -> Option<SerenityChannelId> {
    NonZeroU64::new(id.0).map(SerenityChannelId::from)
}

fn serenity_guild(id: GuildId) -> Option<SerenityGuildId> {
    NonZeroU64::new(id.0).map(SerenityGuildId::from)
}

fn require<T>(value: Option<T>, what: &str, id: u64) -> TransportResult<T> {
    value.ok_or_else(|| TransportError::new(format!("Invalid {} snowflake: {}", what, id)))
}

/// Cache, HTTP client and shard manager of one serenity client.
pub struct SerenityHandle {
    cache: Arc<Cache>,
    http: Arc<Http>,
    shard_manager: Arc<ShardManager>,
    created: RwLock<HashMap<ChannelId, ChannelInfo>>,
    removed: RwLock<HashSet<ChannelId>>,
}

impl SerenityHandle {
    /// Wrap the shared parts of a built serenity client.
    pub fn new(cache: Arc<Cache>, http: Arc<Http>, shard_manager: Arc<ShardManager>) -> Self {
        Self {
            cache,
            http,
            shard_manager,
            created: RwLock::new(HashMap::new()),
            removed: RwLock::new(HashSet::new()),
        }
    }

    /// Guild channel, cloned out of the cache so no cache lock is held.
    fn cached_channel(&self, id: SerenityChannelId) -> Option<GuildChannel> {
        self.cache.channel(id).map(|channel| GuildChannel::clone(&channel))
    }

    fn guild_channels(&self, id: SerenityGuildId) -> Vec<GuildChannel> {
        self.cache
            .guild(id)
            .map(|guild| guild.channels.values().cloned().collect())
            .unwrap_or_default()
    }

    fn to_info(&self, channel: &GuildChannel) -> ChannelInfo {
        let member_ids = match channel.members(&self.cache) {
            Ok(members) => members
                .iter()
                .map(|member| UserId(member.user.id.get()))
                .collect(),
            // Categories and other containers have no members of their own.
            Err(_) => Vec::new(),
        };
        channel_info(channel, member_ids)
    }

    fn is_removed(&self, id: ChannelId) -> bool {
        self.removed.read().contains(&id)
    }
}

impl std::fmt::Debug for SerenityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerenityHandle")
            .field("created", &self.created.read().len())
            .field("removed", &self.removed.read().len())
            .finish_non_exhaustive()
    }
}

impl Directory for SerenityHandle {
    fn current_user(&self) -> Option<UserInfo> {
        let user = self.cache.current_user();
        Some(user_info(&user))
    }

    fn user(&self, id: UserId) -> Option<UserInfo> {
        let user = self.cache.user(serenity_user(id)?)?;
        Some(user_info(&user))
    }

    fn channel(&self, id: ChannelId) -> Option<ChannelInfo> {
        if self.is_removed(id) {
            return None;
        }
        match self.cached_channel(serenity_channel(id)?) {
            Some(channel) => Some(self.to_info(&channel)),
            None => self.created.read().get(&id).cloned(),
        }
    }

    fn guild(&self, id: GuildId) -> Option<GuildInfo> {
        let guild = self.cache.guild(serenity_guild(id)?)?;
        Some(GuildInfo {
            id,
            name: guild.name.clone(),
        })
    }

    fn guilds(&self) -> Vec<GuildInfo> {
        let mut ids = self.cache.guilds();
        ids.sort();
        ids.into_iter()
            .filter_map(|id| self.guild(GuildId(id.get())))
            .collect()
    }

    fn channels(&self) -> Vec<ChannelInfo> {
        let mut channels: Vec<ChannelInfo> = self
            .cache
            .guilds()
            .into_iter()
            .flat_map(|guild| self.guild_channels(guild))
            .map(|channel| self.to_info(&channel))
            .filter(|info| !self.is_removed(info.id))
            .collect();

        let known: HashSet<ChannelId> = channels.iter().map(|info| info.id).collect();
        channels.extend(
            self.created
                .read()
                .values()
                .filter(|info| !known.contains(&info.id) && !self.is_removed(info.id))
                .cloned(),
        );
        channels
    }

    fn members(&self) -> Vec<UserInfo> {
        let mut seen = HashSet::new();
        let mut members = Vec::new();
        for guild in self.cache.guilds() {
            let Some(guild) = self.cache.guild(guild) else {
                continue;
            };
            for member in guild.members.values() {
                if seen.insert(member.user.id) {
                    members.push(user_info(&member.user));
                }
            }
        }
        members
    }
}

#[async_trait]
impl Transport for SerenityHandle {
    #[instrument(skip(self, content))]
    async fn send(&self, target: SendTarget, content: Outbound) -> TransportResult<()> {
        let channel = match target {
            SendTarget::User(id) => {
                let user = require(serenity_user(id), "user", id.0)?;
                user.create_dm_channel(&self.http).await?.id
            }
            SendTarget::Channel(id) => require(serenity_channel(id), "channel", id.0)?,
        };

        let builder = match content {
            Outbound::Text(text) => CreateMessage::new().content(text),
            Outbound::Embed(embed) => CreateMessage::new().embed(create_embed(&embed)),
            Outbound::File { name, data } => {
                CreateMessage::new().add_file(CreateAttachment::bytes(data, name))
            }
        };

        channel.send_message(&self.http, builder).await?;
        debug!(channel = %channel, "Message sent");
        Ok(())
    }

    #[instrument(skip(self, request), fields(name = %request.name, kind = ?request.kind))]
    async fn create_channel(&self, request: NewChannel) -> TransportResult<ChannelInfo> {
        let guild = require(serenity_guild(request.guild_id), "guild", request.guild_id.0)?;

        let mut builder =
            CreateChannel::new(request.name.as_str()).kind(serenity_channel_kind(request.kind));
        if let Some(parent) = request.parent_id {
            builder = builder.category(require(serenity_channel(parent), "channel", parent.0)?);
        }

        let channel = guild.create_channel(&self.http, builder).await?;
        let info = channel_info(&channel, Vec::new());
        debug!(channel = %info.id, "Channel created");

        self.removed.write().remove(&info.id);
        self.created.write().insert(info.id, info.clone());
        Ok(info)
    }

    #[instrument(skip(self))]
    async fn delete_channel(&self, channel: ChannelId) -> TransportResult<()> {
        let id = require(serenity_channel(channel), "channel", channel.0)?;
        id.delete(&self.http).await?;
        debug!(channel = %channel, "Channel deleted");

        self.created.write().remove(&channel);
        self.removed.write().insert(channel);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn grant_read(&self, channel: ChannelId, user: UserId) -> TransportResult<()> {
        let channel_id = require(serenity_channel(channel), "channel", channel.0)?;
        let user_id = require(serenity_user(user), "user", user.0)?;

        let overwrite = PermissionOverwrite {
            allow: Permissions::VIEW_CHANNEL | Permissions::READ_MESSAGE_HISTORY,
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Member(user_id),
        };
        channel_id.create_permission(&self.http, overwrite).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_presence(&self, status: Status, activity: Option<String>) -> TransportResult<()> {
        let activity = activity.map(ActivityData::playing);
        let status = online_status(status);

        let runners = self.shard_manager.runners.lock().await;
        if runners.is_empty() {
            warn!("No running shards, presence not changed");
        }
        for info in runners.values() {
            info.runner_tx.set_presence(activity.clone(), status);
        }
        Ok(())
    }

    fn start_typing(&self, channel: ChannelId) -> TypingGuard {
        let Some(id) = serenity_channel(channel) else {
            return TypingGuard::noop();
        };
        let typing = id.start_typing(&self.http);
        TypingGuard::new(move || {
            typing.stop();
        })
    }
}
