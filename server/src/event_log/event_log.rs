use std::{collections::HashMap, time::Duration};

use log::{debug, trace, warn};

use ballast_shared::{
    EntityEvent, EventId, EventKind, EventPayload, GameInstant, NetEntityId, SequenceList,
};

use crate::{event_log::error::EventLogError, UserKey};

/// When an event may be forgotten.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetentionMode {
    /// Keep every event until all subscribed recipients acknowledged it.
    UntilAcked,
    /// Forget an event as soon as it went out once to every subscribed
    /// recipient, for transports that never acknowledge.
    Immediate,
}

#[derive(Clone, Debug)]
pub struct EventLogConfig {
    /// Minimum time before an unacknowledged event is sent again to the same
    /// recipient
    pub resend_interval: Duration,
    pub retention: RetentionMode,
    /// Retained events beyond this count are dropped, oldest first, and
    /// recipients still waiting for them are evicted. Capped below half of the
    /// id space so that id comparisons stay meaningful.
    pub max_pending_events: usize,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            resend_interval: Duration::from_millis(200),
            retention: RetentionMode::UntilAcked,
            max_pending_events: 1024,
        }
    }
}

const MAX_RETAINED: usize = 32_000;

struct LoggedEvent {
    entity: NetEntityId,
    payload: EventPayload,
    sent_to_any: bool,
}

#[derive(Clone, Copy)]
struct SendRecord {
    first_sent: GameInstant,
    last_sent: GameInstant,
}

struct RecipientRecord {
    last_acked: EventId,
    sends: HashMap<EventId, SendRecord>,
}

impl RecipientRecord {
    fn has_acked(&self, id: EventId) -> bool {
        self.last_acked.is_at_or_after(id)
    }
}

/// Server-side ordered log of entity mutations waiting to reach every
/// subscribed recipient.
///
/// Ids come from a single wrapping counter shared by all entities, so events
/// for any one entity always reach a recipient in the order they were logged.
pub struct EntityEventLog {
    config: EventLogConfig,
    events: SequenceList<LoggedEvent>,
    next_id: EventId,
    recipients: HashMap<UserKey, RecipientRecord>,
    evicted: Vec<UserKey>,
}

impl EntityEventLog {
    pub fn new(config: EventLogConfig) -> Self {
        let mut config = config;
        config.max_pending_events = config.max_pending_events.clamp(1, MAX_RETAINED);
        Self {
            config,
            events: SequenceList::new(),
            next_id: EventId::new(1),
            recipients: HashMap::new(),
            evicted: Vec::new(),
        }
    }

    /// Id of the most recently issued event.
    pub fn head(&self) -> EventId {
        self.next_id.prev()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn has_recipient(&self, recipient: &UserKey) -> bool {
        self.recipients.contains_key(recipient)
    }

    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }

    /// Logs a new event for `entity`. If an event for the same entity that
    /// the new payload [replaces](EventPayload::replaces) has not been sent
    /// to anyone yet, and no recipient joined after it was logged, its
    /// payload is replaced instead and its id returned.
    pub fn push<F: FnOnce() -> EventPayload>(
        &mut self,
        entity: NetEntityId,
        kind: EventKind,
        payload_builder: F,
    ) -> Result<EventId, EventLogError> {
        let payload = payload_builder();
        if payload.kind() != kind {
            return Err(EventLogError::WrongKind {
                expected: kind,
                actual: payload.kind(),
            });
        }

        let recipients = &self.recipients;
        let pending = self.events.iter_mut().rev().find(|(id, event)| {
            event.entity == entity
                && !event.sent_to_any
                && payload.replaces(&event.payload)
                // a recipient that joined later counts this id as seen
                && !recipients.values().any(|record| record.has_acked(*id))
        });
        if let Some((id, event)) = pending {
            trace!("coalescing {:?} for {} into event {}", kind, entity, id);
            event.payload = payload;
            return Ok(*id);
        }

        let id = self.next_id;
        self.next_id = id.next();
        self.events.insert_scan_from_back(
            id,
            LoggedEvent {
                entity,
                payload,
                sent_to_any: false,
            },
        );
        trace!("logged {:?} for {} as event {}", kind, entity, id);

        self.enforce_capacity();
        self.collect_garbage();
        Ok(id)
    }

    /// Subscribes a recipient. It starts at the current head and never sees
    /// events issued before it joined.
    pub fn add_recipient(&mut self, recipient: UserKey) -> Result<(), EventLogError> {
        if self.recipients.contains_key(&recipient) {
            return Err(EventLogError::DuplicateRecipient { recipient });
        }
        self.recipients.insert(
            recipient,
            RecipientRecord {
                last_acked: self.head(),
                sends: HashMap::new(),
            },
        );
        debug!("{} subscribed to the event log at {}", recipient, self.head());
        Ok(())
    }

    /// Makes room for `additional` events on top of those retained, raising
    /// `max_pending_events` if needed so that a burst such as a newcomer's
    /// catch-up does not evict anyone.
    pub fn reserve(&mut self, additional: usize) {
        let needed = self.events.len().saturating_add(additional).min(MAX_RETAINED);
        if needed > self.config.max_pending_events {
            debug!(
                "raising the event log capacity from {} to {}",
                self.config.max_pending_events, needed
            );
            self.config.max_pending_events = needed;
        }
    }

    pub fn max_pending_events(&self) -> usize {
        self.config.max_pending_events
    }

    /// Unsubscribes a recipient and releases everything only it was holding.
    pub fn remove_recipient(&mut self, recipient: &UserKey) {
        if self.recipients.remove(recipient).is_some() {
            debug!("{} unsubscribed from the event log", recipient);
            self.collect_garbage();
        }
    }

    /// Events `recipient` has not acknowledged, in id order, skipping those
    /// sent to it less than `resend_interval` ago.
    pub fn drain_for(
        &mut self,
        recipient: &UserKey,
        now: GameInstant,
    ) -> Result<Vec<EntityEvent>, EventLogError> {
        let record = self
            .recipients
            .get_mut(recipient)
            .ok_or(EventLogError::UnknownRecipient {
                recipient: *recipient,
            })?;

        let mut output = Vec::new();
        for (id, event) in self.events.iter_mut() {
            if record.has_acked(*id) {
                continue;
            }
            let due = match record.sends.get(id) {
                Some(send) => {
                    now.saturating_duration_since(send.last_sent) >= self.config.resend_interval
                }
                None => true,
            };
            if !due {
                continue;
            }
            record
                .sends
                .entry(*id)
                .and_modify(|send| send.last_sent = now)
                .or_insert(SendRecord {
                    first_sent: now,
                    last_sent: now,
                });
            event.sent_to_any = true;
            output.push(EntityEvent::new(*id, event.entity, event.payload.clone()));
        }

        if self.config.retention == RetentionMode::Immediate {
            self.collect_garbage();
        }
        Ok(output)
    }

    /// Records that `recipient` has applied every event up to and including
    /// `up_to`. Older acknowledgements are ignored.
    pub fn ack(&mut self, recipient: &UserKey, up_to: EventId) -> Result<(), EventLogError> {
        let head = self.head();
        let record = self
            .recipients
            .get_mut(recipient)
            .ok_or(EventLogError::UnknownRecipient {
                recipient: *recipient,
            })?;
        if up_to.is_more_recent_than(head) {
            return Err(EventLogError::AckBeyondHead {
                recipient: *recipient,
                ack: up_to,
                head,
            });
        }
        if !up_to.is_more_recent_than(record.last_acked) {
            return Ok(());
        }
        record.last_acked = up_to;
        record.sends.retain(|id, _| id.is_more_recent_than(up_to));
        self.collect_garbage();
        Ok(())
    }

    /// When the oldest event `recipient` still owes an acknowledgement for was
    /// first sent to it.
    pub fn oldest_unacked_send(&self, recipient: &UserKey) -> Option<GameInstant> {
        self.recipients
            .get(recipient)?
            .sends
            .values()
            .map(|send| send.first_sent)
            .min()
    }

    /// Number of retained events `recipient` has not acknowledged.
    pub fn pending_for(&self, recipient: &UserKey) -> usize {
        match self.recipients.get(recipient) {
            Some(record) => self
                .events
                .iter()
                .filter(|(id, _)| !record.has_acked(*id))
                .count(),
            None => 0,
        }
    }

    /// Recipients dropped because an event they still needed was discarded.
    pub fn take_evicted(&mut self) -> Vec<UserKey> {
        std::mem::take(&mut self.evicted)
    }

    fn enforce_capacity(&mut self) {
        while self.events.len() > self.config.max_pending_events {
            let Some((id, _)) = self.events.pop_front() else {
                return;
            };
            let lagging: Vec<UserKey> = self
                .recipients
                .iter()
                .filter(|(_, record)| !record.has_acked(id))
                .map(|(key, _)| *key)
                .collect();
            for recipient in lagging {
                warn!(
                    "{} fell too far behind the event log (event {} discarded), evicting",
                    recipient, id
                );
                self.recipients.remove(&recipient);
                self.evicted.push(recipient);
            }
        }
    }

    fn collect_garbage(&mut self) {
        loop {
            let Some((id, _)) = self.events.front() else {
                return;
            };
            let id = *id;
            let releasable = self.recipients.values().all(|record| {
                record.has_acked(id)
                    || (self.config.retention == RetentionMode::Immediate
                        && record.sends.contains_key(&id))
            });
            if !releasable {
                return;
            }
            self.events.pop_front();
            for record in self.recipients.values_mut() {
                record.sends.remove(&id);
            }
        }
    }
}
