//! Conversions between serenity models and core types.

use herald_core::{
    ChannelId, ChannelInfo, ChannelKind, Embed, GuildId, RawMessage, RawStatus, Status, UserId,
    UserInfo,
};
use serenity::all::{
    ChannelType, CreateEmbed, GuildChannel, Message as SerenityMessage, OnlineStatus, User,
};
use tracing::warn;

pub(crate) fn user_info(user: &User) -> UserInfo {
    UserInfo {
        id: UserId(user.id.get()),
        name: user.name.clone(),
        discriminator: user.discriminator.map(|d| d.get()),
        bot: user.bot,
    }
}

pub(crate) fn channel_kind(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::Text => ChannelKind::Text,
        ChannelType::News => ChannelKind::Announcement,
        ChannelType::Voice | ChannelType::Stage => ChannelKind::Voice,
        ChannelType::Category => ChannelKind::Category,
        ChannelType::Private => ChannelKind::Private,
        ChannelType::NewsThread | ChannelType::PublicThread | ChannelType::PrivateThread => {
            ChannelKind::Thread
        }
        _ => ChannelKind::Other,
    }
}

pub(crate) fn serenity_channel_kind(kind: ChannelKind) -> ChannelType {
    match kind {
        ChannelKind::Category => ChannelType::Category,
        ChannelKind::Voice => ChannelType::Voice,
        ChannelKind::Announcement => ChannelType::News,
        _ => ChannelType::Text,
    }
}

pub(crate) fn channel_info(channel: &GuildChannel, member_ids: Vec<UserId>) -> ChannelInfo {
    ChannelInfo {
        id: ChannelId(channel.id.get()),
        name: channel.name.clone(),
        guild_id: Some(GuildId(channel.guild_id.get())),
        kind: channel_kind(channel.kind),
        topic: channel.topic.clone(),
        parent_id: channel.parent_id.map(|id| ChannelId(id.get())),
        member_ids,
    }
}

pub(crate) fn raw_status(status: OnlineStatus) -> RawStatus {
    match status {
        OnlineStatus::Online => RawStatus::Online,
        OnlineStatus::Offline => RawStatus::Offline,
        OnlineStatus::Idle => RawStatus::Idle,
        OnlineStatus::DoNotDisturb => RawStatus::DoNotDisturb,
        OnlineStatus::Invisible => RawStatus::Invisible,
        _ => RawStatus::Unknown,
    }
}

/// Bots cannot appear offline; offline is rendered as invisible.
pub(crate) fn online_status(status: Status) -> OnlineStatus {
    match status {
        Status::Online => OnlineStatus::Online,
        Status::Offline => OnlineStatus::Invisible,
        Status::Away => OnlineStatus::Idle,
        Status::DoNotDisturb => OnlineStatus::DoNotDisturb,
    }
}

pub(crate) fn raw_message(message: &SerenityMessage) -> RawMessage {
    let embeds = message
        .embeds
        .iter()
        .filter_map(|embed| match serde_json::to_value(embed) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "Dropping unserializable embed");
                None
            }
        })
        .collect();

    RawMessage {
        channel_id: ChannelId(message.channel_id.get()),
        private: message.guild_id.is_none(),
        author_id: UserId(message.author.id.get()),
        content: message.content.clone(),
        mentions: message.mentions.iter().map(|u| UserId(u.id.get())).collect(),
        embeds,
    }
}

pub(crate) fn create_embed(embed: &Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new();
    if let Some(ref title) = embed.title {
        builder = builder.title(title);
    }
    if let Some(ref description) = embed.description {
        builder = builder.description(description);
    }
    if let Some(color) = embed.color {
        builder = builder.color(color);
    }
    if let Some(ref image) = embed.image {
        builder = builder.image(image);
    }
    if let Some(ref thumbnail) = embed.thumbnail {
        builder = builder.thumbnail(thumbnail);
    }
    for field in &embed.fields {
        builder = builder.field(&field.name, &field.value, field.inline);
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_round_trip_where_possible() {
        assert_eq!(raw_status(online_status(Status::Online)).to_status(), Some(Status::Online));
        assert_eq!(raw_status(online_status(Status::Away)).to_status(), Some(Status::Away));
        assert_eq!(raw_status(online_status(Status::Offline)).to_status(), None);
    }

    #[test]
    fn channel_kinds() {
        assert_eq!(channel_kind(ChannelType::News), ChannelKind::Announcement);
        assert_eq!(channel_kind(ChannelType::Category), ChannelKind::Category);
        assert_eq!(serenity_channel_kind(ChannelKind::Category), ChannelType::Category);
        assert_eq!(serenity_channel_kind(ChannelKind::Text), ChannelType::Text);
    }
}
