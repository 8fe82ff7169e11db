//! GraphQL → domain records

use serde_json::Value;
use xtra_media_providers::gql::client::decode;
use xtra_media_providers::gql::types::{
    Connection, CurrentUserData, GameData, GqlClip, GqlGame, GqlStream, GqlTag, GqlUser, GqlVideo, SearchData,
    SearchSection, TopGamesData, TopStreamsData, UserData,
};
use xtra_media_providers::{BroadcastType, ProviderClientError};

use super::{collect, non_blank, page};
use crate::backend::BackendKind;
use crate::models::{Channel, Clip, DomainRecord, Game, LogicalQuery, Page, Stream, Tag, Video};

const BACKEND: BackendKind = BackendKind::Gql;

/// Normalize the `data` object returned for `query`.
///
/// A missing parent object (unknown channel or game) is an empty final
/// page; a body that does not match the expected shape is `Malformed`.
pub fn normalize(query: &LogicalQuery, data: Value) -> Result<Page<DomainRecord>, ProviderClientError> {
    Ok(match query {
        LogicalQuery::TopGames { .. } => {
            let data: TopGamesData = decode(data)?;
            connection(data.directories_with_tags, game)
        }
        LogicalQuery::TopStreams { .. } => {
            let data: TopStreamsData = decode(data)?;
            connection(data.streams, |s| stream(s, None))
        }
        LogicalQuery::GameStreams { .. } => {
            let data: GameData = decode(data)?;
            connection(data.game.and_then(|g| g.streams), |s| stream(s, None))
        }
        LogicalQuery::GameVideos { .. } => {
            let data: GameData = decode(data)?;
            connection(data.game.and_then(|g| g.videos), video)
        }
        LogicalQuery::GameClips { .. } => {
            let data: GameData = decode(data)?;
            connection(data.game.and_then(|g| g.clips), clip)
        }
        LogicalQuery::ChannelVideos { .. } => {
            let data: UserData = decode(data)?;
            connection(data.user.and_then(|u| u.videos), video)
        }
        LogicalQuery::ChannelClips { .. } => {
            let data: UserData = decode(data)?;
            connection(data.user.and_then(|u| u.clips), clip)
        }
        LogicalQuery::SearchChannels { .. } => {
            let data: SearchData = decode(data)?;
            search(data.search_for.and_then(|s| s.channels), channel)
        }
        LogicalQuery::SearchGames { .. } => {
            let data: SearchData = decode(data)?;
            search(data.search_for.and_then(|s| s.games), game)
        }
        LogicalQuery::SearchVideos { .. } => {
            let data: SearchData = decode(data)?;
            search(data.search_for.and_then(|s| s.videos), video)
        }
        LogicalQuery::FollowedStreams { .. } => {
            let data: CurrentUserData = decode(data)?;
            followed_live(data.current_user.and_then(|u| u.followed_live_users))
        }
        LogicalQuery::FollowedVideos => {
            let data: CurrentUserData = decode(data)?;
            connection(data.current_user.and_then(|u| u.followed_videos), video)
        }
        LogicalQuery::FollowedChannels { .. } => {
            let data: CurrentUserData = decode(data)?;
            follows(data.current_user.and_then(|u| u.follows))
        }
        LogicalQuery::FollowedGames => {
            let data: CurrentUserData = decode(data)?;
            let nodes = data.current_user.and_then(|u| u.followed_games).map(|g| g.nodes).unwrap_or_default();
            page(BACKEND, collect(nodes, game), None, false)
        }
    })
}

/// Null nodes reach `collect` so they count as skipped.
fn connection<N, R>(conn: Option<Connection<N>>, mut f: impl FnMut(N) -> Option<R>) -> Page<DomainRecord>
where
    R: Into<DomainRecord>,
{
    let Some(conn) = conn else {
        return Page::end(BACKEND);
    };
    let has_more = conn.has_next_page();
    let cursor = conn.last_cursor().map(str::to_string);
    let nodes = conn.edges.into_iter().map(|edge| edge.node);
    page(BACKEND, collect(nodes, |node| node.and_then(&mut f)), cursor.as_deref(), has_more)
}

fn search<N, R>(section: Option<SearchSection<N>>, mut f: impl FnMut(N) -> Option<R>) -> Page<DomainRecord>
where
    R: Into<DomainRecord>,
{
    let Some(section) = section else {
        return Page::end(BACKEND);
    };
    let has_more = section.has_next_page();
    let items = collect(section.edges.into_iter().map(|edge| edge.item), |item| item.and_then(&mut f));
    page(BACKEND, items, section.cursor.as_deref(), has_more)
}

fn follows(conn: Option<Connection<GqlUser>>) -> Page<DomainRecord> {
    let Some(conn) = conn else {
        return Page::end(BACKEND);
    };
    let has_more = conn.has_next_page();
    let cursor = conn.last_cursor().map(str::to_string);
    let entries = conn.edges.into_iter().map(|edge| {
        let followed_at = edge.followed_at;
        edge.node.map(|user| (user, followed_at))
    });
    let items = collect(entries, |entry| {
        let (user, followed_at) = entry?;
        channel(user).map(|c| Channel { followed_at, ..c })
    });
    page(BACKEND, items, cursor.as_deref(), has_more)
}

/// Live follows only; offline users are not entries of this listing.
fn followed_live(conn: Option<Connection<GqlUser>>) -> Page<DomainRecord> {
    let Some(conn) = conn else {
        return Page::end(BACKEND);
    };
    let has_more = conn.has_next_page();
    let cursor = conn.last_cursor().map(str::to_string);
    let nodes = conn
        .edges
        .into_iter()
        .map(|edge| edge.node)
        .filter(|node| !matches!(node, Some(user) if user.stream.is_none()));
    page(BACKEND, collect(nodes, |node| node.and_then(live_user)), cursor.as_deref(), has_more)
}

pub(crate) fn game(g: GqlGame) -> Option<Game> {
    let name = non_blank(g.name).or_else(|| non_blank(g.display_name))?;
    Some(Game {
        id: non_blank(g.id),
        name,
        box_art_url: g.box_art_url,
        viewer_count: g.viewers_count,
        broadcaster_count: g.broadcasters_count,
        tags: g.tags.into_iter().filter_map(tag).collect(),
    })
}

pub(crate) fn tag(t: GqlTag) -> Option<Tag> {
    let name = non_blank(t.localized_name)
        .or_else(|| non_blank(t.tag_name))
        .or_else(|| non_blank(t.name))?;
    Some(Tag { id: non_blank(t.id), name })
}

pub(crate) fn channel(u: GqlUser) -> Option<Channel> {
    let login = non_blank(u.login)?;
    Some(Channel {
        id: non_blank(u.id),
        login,
        display_name: u.display_name,
        profile_image_url: u.profile_image_url,
        followers: u.followers.and_then(|f| f.total_count),
        is_live: u.stream.as_ref().map(|_| true),
        followed_at: None,
    })
}

/// Stream record; `owner` fills in when the stream itself has no broadcaster
fn stream(s: GqlStream, owner: Option<&GqlUser>) -> Option<Stream> {
    let broadcaster = s.broadcaster.as_ref().or(owner);
    let channel_login = broadcaster.and_then(|b| b.login.clone()).filter(|l| !l.trim().is_empty())?;
    Some(Stream {
        id: non_blank(s.id.clone()),
        channel_id: broadcaster.and_then(|b| b.id.clone()),
        channel_login,
        channel_name: broadcaster.and_then(|b| b.display_name.clone()),
        game_id: s.game.as_ref().and_then(|g| g.id.clone()),
        game_name: s.game.as_ref().and_then(|g| g.display_name.clone().or_else(|| g.name.clone())),
        title: s.title,
        viewer_count: s.viewers_count,
        started_at: s.created_at,
        language: None,
        thumbnail_url: s.preview_image_url,
        profile_image_url: broadcaster.and_then(|b| b.profile_image_url.clone()),
        tags: s.freeform_tags.into_iter().filter_map(tag).map(|t| t.name).collect(),
    })
}

fn live_user(mut user: GqlUser) -> Option<Stream> {
    let live = user.stream.take()?;
    stream(*live, Some(&user))
}

fn video(v: GqlVideo) -> Option<Video> {
    let id = non_blank(v.id)?;
    let owner = v.owner.as_ref();
    Some(Video {
        id,
        channel_id: owner.and_then(|o| o.id.clone()),
        channel_login: owner.and_then(|o| o.login.clone()),
        channel_name: owner.and_then(|o| o.display_name.clone()),
        title: v.title,
        view_count: v.view_count,
        created_at: v.published_at.or(v.created_at),
        duration_seconds: v.length_seconds,
        thumbnail_url: v.preview_thumbnail_url,
        broadcast_type: v.broadcast_type.as_deref().and_then(BroadcastType::parse),
        game_id: v.game.as_ref().and_then(|g| g.id.clone()),
        game_name: v.game.as_ref().and_then(|g| g.display_name.clone().or_else(|| g.name.clone())),
    })
}

fn clip(c: GqlClip) -> Option<Clip> {
    let id = non_blank(c.slug).or_else(|| non_blank(c.id))?;
    let broadcaster = c.broadcaster.as_ref();
    Some(Clip {
        id,
        channel_id: broadcaster.and_then(|b| b.id.clone()),
        channel_login: broadcaster.and_then(|b| b.login.clone()),
        channel_name: broadcaster.and_then(|b| b.display_name.clone()),
        title: c.title,
        view_count: c.view_count,
        created_at: c.created_at,
        duration_seconds: c.duration_seconds,
        thumbnail_url: c.thumbnail_url,
        video_id: c.video.and_then(|v| v.id),
        video_offset_seconds: c.video_offset_seconds,
        game_id: c.game.as_ref().and_then(|g| g.id.clone()),
        game_name: c.game.as_ref().and_then(|g| g.display_name.clone().or_else(|| g.name.clone())),
    })
}
