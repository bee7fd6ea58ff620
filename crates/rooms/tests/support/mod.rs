#![allow(clippy::unwrap_used, clippy::expect_used)]
//! In-memory `VoicePlatform` for exercising the lifecycle without a gateway.

#![allow(dead_code)]

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex},
};

use {
    async_trait::async_trait,
    tempvoice_common::{ChannelId, GuildId, MemberId},
    tempvoice_config::{MemorySettingsStore, RoomsConfig, Settings},
    tempvoice_rooms::{
        CreatedChannel, Error, LifecycleController, MembershipMovement, Result, RoomRegistry,
        SettingsHandle, SetupHandler, VoiceChannelSpec, VoicePlatform,
    },
};

pub fn guild() -> GuildId {
    GuildId::new(1).unwrap()
}

pub fn channel(raw: u64) -> ChannelId {
    ChannelId::new(raw).unwrap()
}

pub fn member(raw: u64) -> MemberId {
    MemberId::new(raw).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Category,
    Voice,
}

#[derive(Debug, Clone)]
pub struct FakeChannel {
    pub name: String,
    pub kind: Kind,
    pub parent: Option<ChannelId>,
    pub members: BTreeSet<MemberId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FindCategory(String),
    ParentCategory(ChannelId),
    Create(VoiceChannelSpec),
    Delete(ChannelId),
    Move(MemberId, ChannelId),
    Occupancy(ChannelId),
    DirectMessage(MemberId, String),
}

#[derive(Debug, Default)]
pub struct Failures {
    pub parent: bool,
    pub create: bool,
    pub delete: bool,
    pub moves: bool,
    pub direct_message: bool,
    pub occupancy: bool,
    pub find_category: bool,
}

#[derive(Debug, Default)]
struct State {
    channels: BTreeMap<ChannelId, FakeChannel>,
    next_id: u64,
    calls: Vec<Call>,
    fail: Failures,
}

#[derive(Debug)]
pub struct FakePlatform {
    state: Mutex<State>,
}

#[derive(Debug, thiserror::Error)]
#[error("injected failure: {0}")]
pub struct Injected(&'static str);

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1_000,
                ..Default::default()
            }),
        }
    }
}

impl FakePlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_category(&self, id: ChannelId, name: &str) {
        self.insert(id, name, Kind::Category, None);
    }

    pub fn add_voice(&self, id: ChannelId, name: &str, parent: Option<ChannelId>) {
        self.insert(id, name, Kind::Voice, parent);
    }

    fn insert(&self, id: ChannelId, name: &str, kind: Kind, parent: Option<ChannelId>) {
        self.state.lock().unwrap().channels.insert(id, FakeChannel {
            name: name.to_string(),
            kind,
            parent,
            members: BTreeSet::new(),
        });
    }

    /// Drop a channel without going through the platform API.
    pub fn remove_channel(&self, id: ChannelId) {
        self.state.lock().unwrap().channels.remove(&id);
    }

    pub fn fail(&self, f: impl FnOnce(&mut Failures)) {
        f(&mut self.state.lock().unwrap().fail);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn creates(&self) -> Vec<VoiceChannelSpec> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<ChannelId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn direct_messages(&self) -> Vec<(MemberId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DirectMessage(m, text) => Some((m, text)),
                _ => None,
            })
            .collect()
    }

    pub fn channel(&self, id: ChannelId) -> Option<FakeChannel> {
        self.state.lock().unwrap().channels.get(&id).cloned()
    }

    pub fn exists(&self, id: ChannelId) -> bool {
        self.channel(id).is_some()
    }

    pub fn location(&self, who: MemberId) -> Option<ChannelId> {
        self.state
            .lock()
            .unwrap()
            .channels
            .iter()
            .find(|(_, c)| c.members.contains(&who))
            .map(|(id, _)| *id)
    }

    /// Apply a presence change the way the gateway would, returning the
    /// movement the controller receives (state already reflects the move).
    pub fn transition(&self, who: MemberId, to: Option<ChannelId>) -> MembershipMovement {
        let previous = self.location(who);
        {
            let mut state = self.state.lock().unwrap();
            place(&mut state, who, to);
        }
        MembershipMovement {
            guild_id: guild(),
            member_id: who,
            display_name: format!("user{}", who.get()),
            account_tag: format!("user{}#0001", who.get()),
            previous,
            current: to,
        }
    }

    async fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
        // Every platform call is a suspension point.
        tokio::task::yield_now().await;
    }

    fn failing(&self, pick: impl FnOnce(&Failures) -> bool) -> bool {
        pick(&self.state.lock().unwrap().fail)
    }
}

fn place(state: &mut State, who: MemberId, to: Option<ChannelId>) {
    for c in state.channels.values_mut() {
        c.members.remove(&who);
    }
    if let Some(to) = to
        && let Some(c) = state.channels.get_mut(&to)
    {
        c.members.insert(who);
    }
}

fn injected(what: &'static str) -> Error {
    Error::platform(what, Injected(what))
}

#[async_trait]
impl VoicePlatform for FakePlatform {
    async fn find_category(&self, _guild: GuildId, keyword: &str) -> Result<Option<ChannelId>> {
        self.record(Call::FindCategory(keyword.to_string())).await;
        if self.failing(|f| f.find_category) {
            return Err(injected("find category"));
        }
        let keyword = keyword.to_lowercase();
        Ok(self
            .state
            .lock()
            .unwrap()
            .channels
            .iter()
            .find(|(_, c)| c.kind == Kind::Category && c.name.to_lowercase().contains(&keyword))
            .map(|(id, _)| *id))
    }

    async fn parent_category(
        &self,
        _guild: GuildId,
        channel: ChannelId,
    ) -> Result<Option<ChannelId>> {
        self.record(Call::ParentCategory(channel)).await;
        if self.failing(|f| f.parent) {
            return Err(injected("resolve parent"));
        }
        self.channel(channel)
            .map(|c| c.parent)
            .ok_or_else(|| Error::unavailable("unknown channel"))
    }

    async fn create_voice_channel(
        &self,
        _guild: GuildId,
        spec: VoiceChannelSpec,
    ) -> Result<CreatedChannel> {
        self.record(Call::Create(spec.clone())).await;
        if self.failing(|f| f.create) {
            return Err(injected("create channel"));
        }
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = channel(state.next_id);
        state.channels.insert(id, FakeChannel {
            name: spec.name.clone(),
            kind: Kind::Voice,
            parent: spec.parent,
            members: BTreeSet::new(),
        });
        Ok(CreatedChannel {
            id,
            name: spec.name,
        })
    }

    async fn delete_channel(&self, _guild: GuildId, channel: ChannelId) -> Result<()> {
        self.record(Call::Delete(channel)).await;
        if self.failing(|f| f.delete) {
            return Err(injected("delete channel"));
        }
        self.state.lock().unwrap().channels.remove(&channel);
        Ok(())
    }

    async fn move_member(&self, _guild: GuildId, who: MemberId, to: ChannelId) -> Result<()> {
        self.record(Call::Move(who, to)).await;
        if self.failing(|f| f.moves) {
            return Err(injected("move member"));
        }
        let mut state = self.state.lock().unwrap();
        if !state.channels.contains_key(&to) {
            return Err(Error::unavailable("target channel is gone"));
        }
        place(&mut state, who, Some(to));
        Ok(())
    }

    async fn occupancy(&self, _guild: GuildId, channel: ChannelId) -> Result<usize> {
        self.record(Call::Occupancy(channel)).await;
        if self.failing(|f| f.occupancy) {
            return Err(injected("occupancy"));
        }
        Ok(self.channel(channel).map(|c| c.members.len()).unwrap_or(0))
    }

    async fn send_direct_message(&self, who: MemberId, text: &str) -> Result<()> {
        self.record(Call::DirectMessage(who, text.to_string())).await;
        if self.failing(|f| f.direct_message) {
            return Err(injected("direct message"));
        }
        Ok(())
    }
}

/// A guild with a "Voice Channels" category holding creation channel C1 (=10).
pub struct Harness {
    pub platform: Arc<FakePlatform>,
    pub registry: Arc<RoomRegistry>,
    pub settings: Arc<SettingsHandle>,
    pub store: Arc<MemorySettingsStore>,
    pub controller: LifecycleController,
    pub setup: SetupHandler,
}

pub const CATEGORY: u64 = 5;
pub const CREATION: u64 = 10;
pub const LOUNGE: u64 = 20;

impl Harness {
    pub fn new() -> Self {
        Self::with_config(RoomsConfig::default())
    }

    pub fn with_config(config: RoomsConfig) -> Self {
        let platform = FakePlatform::new();
        platform.add_category(channel(CATEGORY), "Voice Channels");
        platform.add_voice(channel(CREATION), "➕ Create Channel", Some(channel(CATEGORY)));
        platform.add_voice(channel(LOUNGE), "Lounge", None);

        let store = Arc::new(MemorySettingsStore::new(Settings {
            creation_channel_id: Some(channel(CREATION)),
        }));
        Self::assemble(platform, store, config)
    }

    pub fn unconfigured() -> Self {
        let platform = FakePlatform::new();
        platform.add_voice(channel(CREATION), "➕ Create Channel", None);
        Self::assemble(
            platform,
            Arc::new(MemorySettingsStore::default()),
            RoomsConfig::default(),
        )
    }

    fn assemble(
        platform: Arc<FakePlatform>,
        store: Arc<MemorySettingsStore>,
        config: RoomsConfig,
    ) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let settings = Arc::new(SettingsHandle::load(store.clone()).unwrap());
        let controller = LifecycleController::new(
            platform.clone(),
            registry.clone(),
            settings.clone(),
            config.clone(),
        );
        let setup = SetupHandler::new(platform.clone(), settings.clone(), config);
        Self {
            platform,
            registry,
            settings,
            store,
            controller,
            setup,
        }
    }

    /// Register an already provisioned room owned by `owner`, with `owner` inside.
    pub fn seed_room(&self, id: u64, owner: u64) -> ChannelId {
        let id = channel(id);
        self.platform.add_voice(id, "seeded", Some(channel(CATEGORY)));
        self.platform.transition(member(owner), Some(id));
        assert!(self.registry.register(id, guild(), member(owner)));
        id
    }
}
