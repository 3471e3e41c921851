//! Subscriber registry for change notification

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::key::{StateKey, StateValue, Topic};

/// Called with `(new_value, old_value)`
pub type Callback = Rc<dyn Fn(&StateValue, &StateValue)>;

struct Entry {
    id: u64,
    callback: Callback,
}

#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    next_id: u64,
    topics: HashMap<Topic, Vec<Entry>>,
}

impl SubscriberRegistry {
    pub(crate) fn add(&mut self, topic: Topic, callback: Callback) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.topics
            .entry(topic)
            .or_default()
            .push(Entry { id, callback });
        id
    }

    pub(crate) fn remove(&mut self, topic: &Topic, id: u64) -> bool {
        let Some(entries) = self.topics.get_mut(topic) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.topics.remove(topic);
        }
        removed
    }

    /// Callbacks to run for a change of `key`: the key's own subscribers in
    /// registration order, then wildcard subscribers.
    pub(crate) fn listeners(&self, key: &StateKey) -> Vec<Callback> {
        let keyed = self.topics.get(&Topic::Key(key.clone()));
        let wildcard = self.topics.get(&Topic::All);
        keyed
            .into_iter()
            .chain(wildcard)
            .flatten()
            .map(|e| e.callback.clone())
            .collect()
    }

    pub(crate) fn count(&self, topic: &Topic) -> usize {
        self.topics.get(topic).map_or(0, Vec::len)
    }
}

/// Handle returned by `StateStore::subscribe`
///
/// Dropping the handle keeps the subscription alive; call `unsubscribe`
/// to remove it.
pub struct Subscription {
    registry: Weak<RefCell<SubscriberRegistry>>,
    topic: Topic,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(registry: &Rc<RefCell<SubscriberRegistry>>, topic: Topic, id: u64) -> Self {
        Self {
            registry: Rc::downgrade(registry),
            topic,
            id,
        }
    }

    /// Remove exactly this callback. Safe to call more than once.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().remove(&self.topic, self.id);
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}
