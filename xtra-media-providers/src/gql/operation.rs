//! Persisted-query operation registry
//!
//! Every GraphQL operation is identified on the wire by a fixed sha256 hash.
//! The table below is the single place those hashes live; builders refer to
//! operations by variant, never by string.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde_json::{Map, Value};

use crate::error::ProviderClientError;

/// Static description of one persisted operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDef {
    pub name: &'static str,
    pub sha256_hash: &'static str,
    /// Mutating operations need token, device id and integrity token
    pub mutating: bool,
    /// Dotted variable paths that must be present and non-blank
    pub required: &'static [&'static str],
}

macro_rules! operations {
    ($( $variant:ident => $name:literal, $hash:literal, $mutating:literal, [$($req:literal),*]; )*) => {
        /// Known persisted operations
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Operation {
            $( $variant, )*
        }

        impl Operation {
            pub const ALL: &'static [Operation] = &[ $( Operation::$variant, )* ];

            #[must_use]
            pub const fn def(&self) -> &'static OperationDef {
                match self {
                    $( Operation::$variant => &OperationDef {
                        name: $name,
                        sha256_hash: $hash,
                        mutating: $mutating,
                        required: &[$($req),*],
                    }, )*
                }
            }
        }
    };
}

operations! {
    PlaybackAccessToken => "PlaybackAccessToken", "0828119ded1c13477966434e15800ff57ddacf13ba1911c129dc2200705b0712", false, [];
    ClipAccessToken => "VideoAccessToken_Clip", "36b89d2507fce29e5ca551df756d27c1cfe079e2609642b4390aa4c35796eb11", false, ["slug"];
    ChannelClipCore => "ChannelClipCore", "16d402536bdd88b9db9a7cc87da5769607676abf22ad46b6cfab57a2b8b0b20e", false, ["clipSlug"];
    ChatClip => "ChatClip", "9aa558e066a22227c5ef2c0a8fded3aaa57d35181ad15f63df25bff516253a90", false, ["clipSlug"];
    TopGames => "BrowsePage_AllDirectories", "78957de9388098820e222c88ec14e85aaf6cf844adf44c8319c545c75fd63203", false, [];
    TopStreams => "BrowsePage_Popular", "b32fa28ffd43e370b42de7d9e6e3b8a7ca310035fdbb83932150443d6b693e4d", false, [];
    GameStreams => "DirectoryPage_Game", "df4bb6cc45055237bfaf3ead608bbafb79815c7100b6ee126719fac3762ddf8b", false, ["name"];
    GameVideos => "DirectoryVideos_Game", "c04a45b3adfcfacdff2bf4c4172ca4904870d62d6d19f3d490705c5d0a9e511e", false, ["gameName"];
    GameClips => "ClipsCards__Game", "0d8d0eba9fc7ef77de54a7d933998e21ad7a1274c867ec565ac14ffdce77b1f9", false, ["gameName"];
    ChannelVideos => "FilterableVideoTower_Videos", "a937f1d22e269e39a03b509f65a7490f9fc247d7f83d6ac1421523e3b68042cb", false, ["channelOwnerLogin"];
    ChannelClips => "ClipsCards__User", "b73ad2bfaecfd30a9e6c28fada15bd97032c83ec77a0440766a56fe0bd632777", false, ["login"];
    ChatViewers => "ChatViewers", "e0761ef5444ee3acccee5cfc5b834cbfd7dc220133aa5fbefe1b66120f506250", false, ["channelLogin"];
    SearchResults => "SearchResultsPage_SearchResults", "ee977ac21b324669b4c109be49ed3032227e8850bea18503d0ced68e8156c2a5", false, ["query"];
    SearchFreeformTags => "SearchFreeformTags", "8bc91a618bb5f0c5f9bc19195028c9f4a6a1b8651cf5bd8e4f2408124cdf465a", false, [];
    SearchCategoryTags => "SearchCategoryTags", "b4cb189d8d17aadf29c61e9d7c7e7dcfc932e93b77b3209af5661bffb484195f", false, [];
    ChatBadges => "ChatList_Badges", "86f43113c04606e6476e39dcd432dee47c994d77a83e54b732e11d4935f0cd08", false, ["channelLogin"];
    GlobalCheerConfig => "BitsConfigContext_Global", "6a265b86f3be1c8d11bdcf32c183e106028c6171e985cc2584d15f7840f5fee6", false, [];
    ChannelCheerConfig => "BitsConfigContext_Channel", "368aaf9c04d3876cdd0076c105af2cd44b3bfd51a688462152ed4d3a5657e2b9", false, ["login"];
    VideoComments => "VideoCommentsByOffsetOrCursor", "b70a3591ff0f4e0313d126c6a1502d79a1c02baebb288227c582044aa76adf6a", false, ["videoID"];
    VideoChapters => "VideoPlayer_ChapterSelectButtonVideo", "8d2793384aac3773beab5e59bd5d6f585aedb923d292800119e03d40cd0f9b41", false, ["videoID"];
    ViewerCount => "UseViewCount", "00b11c9c428f79ae228f30080a06ffd8226a1f068d6f52fbc057cbde66e994c2", false, ["channelLogin"];
    EmoteCard => "EmoteCard", "556230dd63957761355ba54232c43f4781f31ed6686fc827053b9aa7b199848f", false, ["emoteID"];
    FollowedStreams => "FollowingLive_CurrentUser", "40ac5a060fa06ba73e07bf8dd8c3cf6aca4494aeed2222c986ed47ffddf31f51", false, [];
    FollowedVideos => "FollowedVideos_CurrentUser", "a8e02d4cc25511e9997842c80333e15ba0bb9e11b4199e31c5207317faff9618", false, [];
    FollowedChannels => "ChannelFollows", "4b9cb31b54b9213e5760f2f6e9e935ad09924cac2f78aac51f8a64d85f028ed0", false, [];
    FollowedGames => "FollowingGames_CurrentUser", "8446d4d234005813dc1f024f487ce95434c3e4202f451dd42777935b5ed035ce", false, [];
    FollowUser => "FollowButton_FollowUser", "800e7346bdf7e5278a3c1d3f21b2b56e2639928f86815677a7126b093b2fdd08", true, ["input.targetID"];
    UnfollowUser => "FollowButton_UnfollowUser", "f7dae976ebf41c755ae2d758546bfd176b4eeb856656098bb40e0a672ca0d880", true, ["input.targetID"];
    FollowGame => "FollowGameButton_FollowGame", "b846b65ba4bc9a3561dbe2d069d95deed9b9e031bcfda2482d1bedd84a1c2eb3", true, ["input.gameID"];
    UnfollowGame => "FollowGameButton_UnfollowGame", "811e02e396ebba0664f21ff002f2eff3c6f57e8af9aedb4f4dfa77cefd0db43d", true, ["input.gameID"];
    FollowingUser => "ChannelSupportButtons", "834a75e1c06cffada00f0900664a5033e392f6fb655fae8d2e25b21b340545a9", false, ["channelLogin"];
    FollowingGame => "FollowGameButton_Game", "cfeda60899b6b867b2d7f30c8556778c4a9cc8268bd1aadd9f88134a0f642a02", false, ["name"];
    ChannelPointsContext => "ChannelPointsContext", "1530a003a7d374b0380b79db0be0534f30ff46e61cffa2bc0e2468a909fbc024", false, ["channelLogin"];
    ClaimPoints => "ClaimCommunityPoints", "46aaeebe02c99afdf4fc97c7c0cba964124bf6b0af229395f1f6d1feed05b3d0", true, ["input.channelID", "input.claimID"];
    JoinRaid => "JoinRaid", "c6a332a86d1087fbbb1a8623aa01bd1313d2386e7c63be60fdb2d1901f01a4ae", true, ["input.raidID"];
    UserEmotes => "AvailableEmotesForChannel", "b9ce64d02e26c6fe9adbfb3991284224498b295542f9c5a51eacd3610e659cfb", false, ["channelID"];
    ChannelPanels => "ChannelPanels", "236b0ec07489e5172ee1327d114172f27aceca206a1a8053106d60926a7f622e", false, ["id"];
    SendAnnouncement => "SendAnnouncementMessage", "f9e37b572ceaca1475d8d50805ae64d6eb388faf758556b2719f44d64e5ba791", true, ["input.channelID", "input.message"];
    BanUser => "Chat_BanUserFromChatRoom", "d7be2d2e1e22813c1c2f3d9d5bf7e425d815aeb09e14001a5f2c140b93f6fb67", true, ["input.channelID", "input.bannedUserLogin"];
    UnbanUser => "Chat_UnbanUserFromChatRoom", "bee22da7ae03569eb9ae41ef857fd1bb75507d4984d764a81fe8775accac71bd", true, ["input.channelID", "input.bannedUserLogin"];
    UpdateChatColor => "Chat_UpdateChatColor", "0371259a74a3db4ff4bf4473d998d8ae8e4f135b20403323691d434f2790e081", true, ["input.color"];
    CreateStreamMarker => "VideoMarkersChatCommand", "c65f8b33e3bcccf2b16057e8f445311d213ecf8729f842ccdc71908231fa9a78", true, ["channelLogin"];
    Moderators => "Mods", "cb912a7e0789e0f8a4c85c25041a08324475831024d03d624172b59498caf085", false, ["login"];
    AddModerator => "ModUser", "46da4ec4229593fe4b1bce911c75625c299638e228262ff621f80d5067695a8a", true, ["input.channelID", "input.targetLogin"];
    RemoveModerator => "UnmodUser", "1ed42ccb3bc3a6e79f51e954a2df233827f94491fbbb9bd05b22b1aaaf219b8b", true, ["input.channelID", "input.targetLogin"];
    StartRaid => "chatCreateRaid", "f4fc7ac482599d81dfb6aa37100923c8c9edeea9ca2be854102a6339197f840a", true, ["input.sourceID", "input.targetID"];
    CancelRaid => "chatCancelRaid", "c388b89e7616a11a8a07b75e3d7bbe7278d37c3c46f43d7c8d4d0262edc00cd9", true, ["input.sourceID"];
    Vips => "VIPs", "612a574d07afe5db2f9e878e290225224a0b955e65b5d1235dcd4b68ff668218", false, ["login"];
    AddVip => "VIPUser", "e8c397f1ed8b1fdbaa201eedac92dd189ecfb2d828985ec159d4ae77f9920170", true, ["input.channelID", "input.granteeLogin"];
    RemoveVip => "UnVIPUser", "2ce4fcdf6667d013aa1f820010e699d1d4abdda55e26539ecf4efba8aff2d661", true, ["input.channelID", "input.revokeeLogin"];
}

impl Operation {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.def().name
    }

    #[must_use]
    pub const fn sha256_hash(&self) -> &'static str {
        self.def().sha256_hash
    }

    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        self.def().mutating
    }

    /// Check that every required variable is present and non-blank.
    pub fn validate(&self, variables: Option<&Map<String, Value>>) -> Result<(), ProviderClientError> {
        for path in self.def().required {
            let present = variables
                .and_then(|vars| lookup(vars, path))
                .is_some_and(|value| match value {
                    Value::Null => false,
                    Value::String(s) => !s.trim().is_empty(),
                    _ => true,
                });
            if !present {
                return Err(ProviderClientError::Validation(format!(
                    "{} requires variable `{path}`",
                    self.name()
                )));
            }
        }
        Ok(())
    }
}

fn lookup<'a>(vars: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = vars.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Name → operation lookup, built once per process
pub struct OperationRegistry {
    by_name: HashMap<&'static str, Operation>,
}

impl OperationRegistry {
    fn build() -> Self {
        let by_name = Operation::ALL.iter().map(|op| (op.name(), *op)).collect();
        Self { by_name }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Operation> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

static REGISTRY: LazyLock<OperationRegistry> = LazyLock::new(OperationRegistry::build);

/// The process-wide operation registry
#[must_use]
pub fn registry() -> &'static OperationRegistry {
    &REGISTRY
}
