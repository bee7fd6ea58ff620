//! Registry of live personal rooms.
//!
//! The registry is the only authority for "this channel is managed by us".
//! Each mutation is a single map operation, so overlapping handlers never
//! observe a half-updated entry.

use std::time::{Duration, Instant};

use {
    dashmap::{DashMap, mapref::entry::Entry},
    tempvoice_common::{ChannelId, GuildId, MemberId},
};

#[cfg(feature = "metrics")]
use tempvoice_metrics::{gauge, rooms as room_metrics};

/// Where a registered room is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// Provisioned and possibly occupied.
    Active,
    /// A handler has claimed the room and issued its deletion.
    Deleting,
}

/// A registered personal room.
#[derive(Debug, Clone)]
pub struct Room {
    pub guild_id: GuildId,
    pub owner: MemberId,
    pub state: RoomState,
    pub registered_at: Instant,
}

impl Room {
    pub fn age(&self) -> Duration {
        self.registered_at.elapsed()
    }
}

/// Result of trying to claim a room for deletion.
#[derive(Debug, Clone)]
pub enum DeleteClaim {
    /// The caller now owns the deletion and must either
    /// [`remove`](RoomRegistry::remove) or [`release`](RoomRegistry::release) it.
    Claimed(Room),
    /// Another handler already claimed it.
    InProgress,
    Unregistered,
}

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<ChannelId, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly provisioned room. Returns `false` (and leaves the
    /// existing entry untouched) if the channel is already registered.
    pub fn register(&self, channel: ChannelId, guild_id: GuildId, owner: MemberId) -> bool {
        let inserted = match self.rooms.entry(channel) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Room {
                    guild_id,
                    owner,
                    state: RoomState::Active,
                    registered_at: Instant::now(),
                });
                true
            },
        };
        self.record_size();
        inserted
    }

    pub fn contains(&self, channel: ChannelId) -> bool {
        self.rooms.contains_key(&channel)
    }

    pub fn get(&self, channel: ChannelId) -> Option<Room> {
        self.rooms.get(&channel).map(|room| room.clone())
    }

    /// An active room the member owns in the given guild, if any.
    pub fn owned_by(&self, guild_id: GuildId, member: MemberId) -> Option<ChannelId> {
        self.rooms
            .iter()
            .find(|entry| {
                let room = entry.value();
                room.guild_id == guild_id && room.owner == member && room.state == RoomState::Active
            })
            .map(|entry| *entry.key())
    }

    /// Move an active room to [`RoomState::Deleting`].
    ///
    /// At most one caller receives [`DeleteClaim::Claimed`] for a given room
    /// until the claim is released.
    pub fn claim_for_deletion(&self, channel: ChannelId) -> DeleteClaim {
        match self.rooms.get_mut(&channel) {
            Some(mut room) if room.state == RoomState::Active => {
                room.state = RoomState::Deleting;
                DeleteClaim::Claimed(room.clone())
            },
            Some(_) => DeleteClaim::InProgress,
            None => DeleteClaim::Unregistered,
        }
    }

    /// Return a claimed room to [`RoomState::Active`] after a failed deletion.
    pub fn release(&self, channel: ChannelId) {
        if let Some(mut room) = self.rooms.get_mut(&channel) {
            room.state = RoomState::Active;
        }
    }

    pub fn remove(&self, channel: ChannelId) -> Option<Room> {
        let removed = self.rooms.remove(&channel).map(|(_, room)| room);
        self.record_size();
        removed
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Every registered channel and its owner, sorted by channel id.
    pub fn snapshot(&self) -> Vec<(ChannelId, MemberId)> {
        let mut rooms: Vec<_> = self
            .rooms
            .iter()
            .map(|entry| (*entry.key(), entry.value().owner))
            .collect();
        rooms.sort_unstable();
        rooms
    }

    fn record_size(&self) {
        #[cfg(feature = "metrics")]
        gauge!(room_metrics::ACTIVE).set(self.rooms.len() as f64);
    }
}
