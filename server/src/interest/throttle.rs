use std::{collections::HashMap, time::Duration};

use ballast_shared::{GameInstant, Item, NetEntityId, Vec2};

use crate::UserKey;

/// How often an entity's position should reach one recipient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateInterval {
    Never,
    After(Duration),
}

impl UpdateInterval {
    pub fn is_never(&self) -> bool {
        matches!(self, UpdateInterval::Never)
    }

    fn scaled(self, factor: u32) -> Self {
        match self {
            UpdateInterval::Never => UpdateInterval::Never,
            UpdateInterval::After(interval) => UpdateInterval::After(interval * factor),
        }
    }
}

/// Contains Config properties for position update throttling
#[derive(Clone, Debug)]
pub struct ThrottleConfig {
    /// Upper bound for the base interval of an entity nobody has heard about
    /// in a while
    pub max_interval: Duration,
    /// `(speed threshold, interval cap)` pairs, fastest first. The first
    /// threshold the entity's speed exceeds caps its base interval.
    pub speed_caps: Vec<(f32, Duration)>,
    /// Fixed minimum interval for recipients without a body of their own
    pub spectator_interval: Duration,
    pub close_distance_sq: f32,
    pub near_distance_sq: f32,
    /// Recipients farther than this never receive updates
    pub far_distance_sq: f32,
    /// Scale applied between `close_distance_sq` and `near_distance_sq`
    pub near_multiplier: u32,
    /// Scale applied between `near_distance_sq` and `far_distance_sq`
    pub mid_multiplier: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_interval: Duration::from_secs(30),
            speed_caps: vec![
                (10.0, Duration::ZERO),
                (1.0, Duration::from_millis(100)),
                (0.1, Duration::from_millis(500)),
            ],
            spectator_interval: Duration::from_millis(500),
            close_distance_sq: 500.0 * 500.0,
            near_distance_sq: 1500.0 * 1500.0,
            far_distance_sq: 5000.0 * 5000.0,
            near_multiplier: 2,
            mid_multiplier: 10,
        }
    }
}

/// Per (entity, recipient) bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecipientInterestState {
    pub last_sent_at: GameInstant,
    pub current_interval: UpdateInterval,
}

struct EntityInterest {
    base_interval: Duration,
    recipients: HashMap<UserKey, RecipientInterestState>,
}

/// Decides how often each entity's position goes out to each recipient,
/// scaling by the entity's speed and the recipient's distance.
pub struct InterestThrottle {
    config: ThrottleConfig,
    entities: HashMap<NetEntityId, EntityInterest>,
}

impl InterestThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            entities: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Grows every base interval by `elapsed`, up to `max_interval`.
    pub fn advance(&mut self, elapsed: Duration) {
        for interest in self.entities.values_mut() {
            interest.base_interval = (interest.base_interval + elapsed).min(self.config.max_interval);
        }
    }

    /// Interval for `item` as seen by a recipient at `recipient_position`, or
    /// by a spectator when `None`.
    pub fn next_interval(&self, item: &Item, recipient_position: Option<Vec2>) -> UpdateInterval {
        if !item.has_body || item.parent().is_some() {
            return UpdateInterval::Never;
        }
        let base = self.capped_base(item);

        let Some(recipient_position) = recipient_position else {
            return UpdateInterval::After(base.max(self.config.spectator_interval));
        };

        let distance_sq = item.position.distance_squared(recipient_position);
        let interval = UpdateInterval::After(base);
        if distance_sq > self.config.far_distance_sq {
            UpdateInterval::Never
        } else if distance_sq > self.config.near_distance_sq {
            interval.scaled(self.config.mid_multiplier)
        } else if distance_sq > self.config.close_distance_sq {
            interval.scaled(self.config.near_multiplier)
        } else {
            interval
        }
    }

    /// Whether `item`'s position is due for `recipient` at `now`. Records the
    /// computed interval on the pair either way.
    pub fn should_send(
        &mut self,
        item: &Item,
        recipient: UserKey,
        recipient_position: Option<Vec2>,
        now: GameInstant,
    ) -> bool {
        let interval = self.next_interval(item, recipient_position);
        let interest = self.entry(item.id);
        let Some(state) = interest.recipients.get_mut(&recipient) else {
            return !interval.is_never();
        };
        state.current_interval = interval;

        // a send stamped later than the current time belongs to a rewound clock
        if state.last_sent_at.is_after(now) {
            interest.recipients.remove(&recipient);
            return !interval.is_never();
        }

        match interval {
            UpdateInterval::Never => false,
            UpdateInterval::After(interval) => {
                now.saturating_duration_since(state.last_sent_at) >= interval
            }
        }
    }

    /// Records a sent position. The base interval keeps growing until the
    /// entity is [`reset`](Self::reset).
    pub fn mark_sent(&mut self, entity: NetEntityId, recipient: UserKey, now: GameInstant) {
        let interest = self.entry(entity);
        let current_interval = interest
            .recipients
            .get(&recipient)
            .map(|state| state.current_interval)
            .unwrap_or(UpdateInterval::After(Duration::ZERO));
        interest.recipients.insert(
            recipient,
            RecipientInterestState {
                last_sent_at: now,
                current_interval,
            },
        );
    }

    /// Restarts the base interval, e.g. after the entity was dropped or moved
    /// by a gameplay action.
    pub fn reset(&mut self, entity: NetEntityId) {
        self.entry(entity).base_interval = Duration::ZERO;
    }

    /// Makes the next `should_send` for this pair succeed unless the pair is
    /// out of range.
    pub fn force_resync(&mut self, entity: NetEntityId, recipient: UserKey) {
        if let Some(interest) = self.entities.get_mut(&entity) {
            interest.recipients.remove(&recipient);
        }
    }

    pub fn state(&self, entity: NetEntityId, recipient: UserKey) -> Option<RecipientInterestState> {
        self.entities
            .get(&entity)?
            .recipients
            .get(&recipient)
            .copied()
    }

    pub fn remove_recipient(&mut self, recipient: &UserKey) {
        for interest in self.entities.values_mut() {
            interest.recipients.remove(recipient);
        }
    }

    pub fn remove_entity(&mut self, entity: &NetEntityId) {
        self.entities.remove(entity);
    }

    fn capped_base(&self, item: &Item) -> Duration {
        let base = self
            .entities
            .get(&item.id)
            .map(|interest| interest.base_interval)
            .unwrap_or(Duration::ZERO);
        let speed = item.speed();
        for (threshold, cap) in &self.config.speed_caps {
            if speed > *threshold {
                return base.min(*cap);
            }
        }
        base
    }

    fn entry(&mut self, entity: NetEntityId) -> &mut EntityInterest {
        self.entities.entry(entity).or_insert_with(|| EntityInterest {
            base_interval: Duration::ZERO,
            recipients: HashMap::new(),
        })
    }
}
