//! Channel message lists
//!
//! Every change rewrites the channel's list and notifies both the broad
//! `messages` key and the channel's own `messages:{id}` key.

use tracing::debug;

use super::{StateKey, StateStore, StateValue};
use crate::models::{Attachment, ChannelId, Message, MessageId};

impl StateStore {
    /// Messages of a channel, oldest first; empty for unknown channels
    pub fn messages_for_channel(&self, channel_id: &ChannelId) -> Vec<Message> {
        self.data
            .borrow()
            .messages
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Append a message, creating the channel's list if needed
    pub fn add_message(&self, channel_id: &ChannelId, message: Message) {
        let mut list = self.messages_for_channel(channel_id);
        list.push(message);
        self.commit_channel_messages(channel_id, list);
    }

    /// Post `content` as the current user. Blank messages without an
    /// attachment, unknown channels and a missing user are ignored.
    pub fn send_message(
        &self,
        channel_id: &ChannelId,
        content: &str,
        attachment: Option<Attachment>,
    ) -> Option<Message> {
        let content = content.trim();
        if content.is_empty() && attachment.is_none() {
            return None;
        }
        if self.find_channel(channel_id).is_none() {
            debug!(channel_id = %channel_id, "Ignoring message to unknown channel");
            return None;
        }
        let author = self.current_user()?;

        let mut message = Message::new(channel_id.clone(), &author, content.to_string());
        if let Some(attachment) = attachment {
            message = message.with_attachment(attachment);
        }
        self.add_message(channel_id, message.clone());
        Some(message)
    }

    pub fn edit_message(&self, channel_id: &ChannelId, message_id: &MessageId, content: &str) -> bool {
        let content = content.trim();
        if content.is_empty() {
            return false;
        }
        self.modify_message(channel_id, message_id, |m| {
            m.content = content.to_string();
            m.edited = true;
        })
    }

    pub fn delete_message(&self, channel_id: &ChannelId, message_id: &MessageId) -> bool {
        let mut list = self.messages_for_channel(channel_id);
        let before = list.len();
        list.retain(|m| &m.id != message_id);
        if list.len() == before {
            return false;
        }
        self.commit_channel_messages(channel_id, list);
        true
    }

    /// Toggle the current user's `emoji` reaction on a message
    pub fn toggle_reaction(&self, channel_id: &ChannelId, message_id: &MessageId, emoji: &str) -> bool {
        let Some(user) = self.current_user() else {
            return false;
        };
        self.modify_message(channel_id, message_id, |m| m.toggle_reaction(emoji, &user.id))
    }

    fn modify_message(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        edit: impl FnOnce(&mut Message),
    ) -> bool {
        let mut list = self.messages_for_channel(channel_id);
        let Some(message) = list.iter_mut().find(|m| &m.id == message_id) else {
            return false;
        };
        edit(message);
        self.commit_channel_messages(channel_id, list);
        true
    }

    /// Store a channel's new list, then notify `messages` followed by
    /// `messages:{channel_id}`
    fn commit_channel_messages(&self, channel_id: &ChannelId, list: Vec<Message>) {
        let (new_all, old_all, old_list) = {
            let mut data = self.data.borrow_mut();
            let old_all = data.messages.clone();
            let old_list = data
                .messages
                .insert(channel_id.clone(), list.clone())
                .unwrap_or_default();
            (data.messages.clone(), old_all, old_list)
        };

        self.notify(
            &StateKey::Messages,
            &StateValue::Messages(new_all),
            &StateValue::Messages(old_all),
        );
        self.notify(
            &StateKey::ChannelMessages(channel_id.clone()),
            &StateValue::ChannelMessages(channel_id.clone(), list),
            &StateValue::ChannelMessages(channel_id.clone(), old_list),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CurrentUser, UserId, UserStatus};
    use crate::state::{StoreOptions, Topic};
    use crate::storage::MemoryPersistence;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn seeded() -> StateStore {
        let store = StateStore::new(Rc::new(MemoryPersistence::new()), StoreOptions::new());
        store.init();
        store
    }

    fn other_user() -> CurrentUser {
        CurrentUser {
            id: UserId::from("user-kit"),
            username: "Kit".to_string(),
            tag: "1187".to_string(),
            avatar: None,
            status: UserStatus::Online,
        }
    }

    #[test]
    fn test_add_message_appends_and_notifies_both_keys() {
        let store = seeded();
        let general = ChannelId::from("ch-general");
        let fired = Rc::new(RefCell::new(Vec::new()));

        let f = fired.clone();
        store.subscribe(StateKey::Messages, move |_, _| f.borrow_mut().push("messages"));
        let f = fired.clone();
        store.subscribe(StateKey::ChannelMessages(general.clone()), move |new, old| {
            if let (StateValue::ChannelMessages(_, new), StateValue::ChannelMessages(_, old)) = (new, old) {
                assert_eq!(new.len(), old.len() + 1);
            }
            f.borrow_mut().push("channel");
        });
        let f = fired.clone();
        store.subscribe(StateKey::ChannelMessages(ChannelId::from("ch-dev")), move |_, _| {
            f.borrow_mut().push("other channel")
        });

        let message = Message::new(general.clone(), &other_user(), "ping".to_string());
        store.add_message(&general, message.clone());

        assert_eq!(store.messages_for_channel(&general).last(), Some(&message));
        assert_eq!(*fired.borrow(), vec!["messages", "channel"]);
    }

    #[test]
    fn test_add_message_creates_missing_list() {
        let store = seeded();
        let fresh = ChannelId::from("ch-dev");
        assert!(store.messages_for_channel(&fresh).is_empty());
        store.add_message(&fresh, Message::new(fresh.clone(), &other_user(), "first".into()));
        assert_eq!(store.messages_for_channel(&fresh).len(), 1);
    }

    #[test]
    fn test_send_edit_react_delete() {
        let store = seeded();
        let general = ChannelId::from("ch-general");

        assert!(store.send_message(&general, "   ", None).is_none());
        assert!(store.send_message(&ChannelId::from("missing"), "hi", None).is_none());

        let sent = store.send_message(&general, " hello ", None).unwrap();
        assert_eq!(sent.content, "hello");

        assert!(store.edit_message(&general, &sent.id, "hello there"));
        let stored = store.messages_for_channel(&general).last().cloned().unwrap();
        assert!(stored.edited);
        assert_eq!(stored.content, "hello there");

        assert!(store.toggle_reaction(&general, &sent.id, "👍"));
        let stored = store.messages_for_channel(&general).last().cloned().unwrap();
        assert_eq!(stored.reaction_count("👍"), 1);

        assert!(store.delete_message(&general, &sent.id));
        assert!(!store.delete_message(&general, &sent.id));
        assert!(store.messages_for_channel(&general).iter().all(|m| m.id != sent.id));
    }

    #[test]
    fn test_edits_are_copy_on_write() {
        let store = seeded();
        let general = ChannelId::from("ch-general");
        let held = store.messages_for_channel(&general);
        let first = held[0].id.clone();

        store.edit_message(&general, &first, "changed");
        assert_ne!(held[0].content, "changed");
        assert_eq!(store.messages_for_channel(&general)[0].content, "changed");
    }

    #[test]
    fn test_wildcard_sees_both_message_keys() {
        let store = seeded();
        let keys = Rc::new(RefCell::new(Vec::new()));
        let k = keys.clone();
        store.subscribe(Topic::All, move |new, _| k.borrow_mut().push(new.key()));

        let general = ChannelId::from("ch-general");
        store.send_message(&general, "hi", None);
        assert_eq!(
            *keys.borrow(),
            vec![StateKey::Messages, StateKey::ChannelMessages(general)]
        );
    }
}
