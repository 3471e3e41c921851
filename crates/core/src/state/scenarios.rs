//! End-to-end behaviour of the store, the voice controller and persistence
//! working together

use std::cell::RefCell;
use std::rc::Rc;

use super::{Persist, StateKey, StateStore, StateValue, StoreOptions, Theme};
use crate::models::{ChannelId, ChannelKind, CurrentUser, Message, RoleId, UserId, UserStatus, ADMIN_ROLE_ID};
use crate::notify::RecordingNotifier;
use crate::permissions::Permission;
use crate::storage::{Database, MemoryPersistence};
use crate::voice::{SimulatedDevices, VoiceSessionController};

fn store_on(persistence: Rc<MemoryPersistence>) -> StateStore {
    let store = StateStore::new(persistence, StoreOptions::new());
    store.init();
    store
}

fn counter(store: &StateStore, id: &str) -> u32 {
    store
        .find_channel(&ChannelId::from(id))
        .map(|c| c.connected_users)
        .unwrap_or_default()
}

#[test]
fn first_launch_seeds_and_selects_text_channel() {
    let store = store_on(Rc::new(MemoryPersistence::new()));

    assert!(!store.dens().is_empty());
    let den = store.active_den().unwrap();
    let channel = store.active_channel().unwrap();
    assert_eq!(channel.kind, ChannelKind::Text);
    assert_eq!(channel.den_id, den.id);
}

#[test]
fn every_channel_can_be_selected() {
    let store = store_on(Rc::new(MemoryPersistence::new()));
    for den in store.dens() {
        for channel in store.channels_for_den(&den.id) {
            store.set_active_channel(&channel.id);
            assert_eq!(
                store.get(&StateKey::ActiveChannel),
                Some(StateValue::ActiveChannel(Some(channel.id.clone())))
            );
        }
    }
}

#[test]
fn repeated_theme_switch_is_silent() {
    let persistence = Rc::new(MemoryPersistence::new());
    let store = store_on(persistence.clone());
    let calls = Rc::new(RefCell::new(0));
    let c = calls.clone();
    store.subscribe(StateKey::CurrentTheme, move |_, _| *c.borrow_mut() += 1);

    assert!(store.set_theme("light", None).is_some());
    let writes = persistence.write_count();
    assert_eq!(*calls.borrow(), 1);

    assert!(store.set_theme("light", None).is_none());
    assert_eq!(store.theme(), Theme::Light);
    assert_eq!(*calls.borrow(), 1);
    assert_eq!(persistence.write_count(), writes);
}

#[test]
fn role_management_needs_a_role() {
    let store = store_on(Rc::new(MemoryPersistence::new()));
    let den = store.active_den_id().unwrap();
    let ember = UserId::from("user-ember");
    let sly = UserId::from("user-sly");
    let admin = RoleId::from(ADMIN_ROLE_ID);

    for member in [&ember, &sly] {
        let found = store.find_member(&den, member).unwrap();
        assert!(!found.is_owner && found.roles.is_empty());
        assert!(!store.has_permission(&den, member, Permission::ManageRoles));
        assert!(store.assign_role(&den, member, member, &admin).is_err());
    }

    store
        .assign_role(&den, &UserId::from("user-local"), &ember, &admin)
        .unwrap();
    assert!(store.has_permission(&den, &ember, Permission::ManageRoles));
    assert!(!store.has_permission(&den, &sly, Permission::ManageRoles));
}

#[test]
fn join_then_leave_restores_counter() {
    let store = store_on(Rc::new(MemoryPersistence::new()));
    let lounge = ChannelId::from("vc-lounge");
    let before = counter(&store, "vc-lounge");

    store.join_voice_channel(&lounge);
    assert_eq!(counter(&store, "vc-lounge"), before + 1);
    store.leave_voice_channel();
    assert_eq!(counter(&store, "vc-lounge"), before);
}

#[test]
fn reconnecting_counts_once_and_deafen_is_symmetric() {
    let store = Rc::new(store_on(Rc::new(MemoryPersistence::new())));
    let mut voice = VoiceSessionController::new(
        store.clone(),
        SimulatedDevices::new(),
        Rc::new(RecordingNotifier::new()),
    );
    let squad = ChannelId::from("vc-squad");

    voice.connect(&squad);
    voice.connect(&squad);
    assert_eq!(counter(&store, "vc-squad"), 1);

    assert!(!store.mic_muted() && !store.deafened());
    voice.toggle_deafen();
    assert!(store.mic_muted() && store.deafened());
    voice.toggle_deafen();
    assert!(!store.mic_muted() && !store.deafened());
}

#[test]
fn unsubscribe_stops_callbacks() {
    let store = store_on(Rc::new(MemoryPersistence::new()));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let subscription = store.subscribe(StateKey::MicMuted, move |new, old| {
        s.borrow_mut().push((new.clone(), old.clone()));
    });

    store.set(StateValue::MicMuted(true));
    assert_eq!(
        *seen.borrow(),
        vec![(StateValue::MicMuted(true), StateValue::MicMuted(false))]
    );

    subscription.unsubscribe();
    store.set(StateValue::MicMuted(false));
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn added_message_lands_last_and_fires_both_keys() {
    let store = store_on(Rc::new(MemoryPersistence::new()));
    let welcome = ChannelId::from("ch-welcome");
    let fired = Rc::new(RefCell::new(Vec::new()));
    for key in [StateKey::Messages, StateKey::ChannelMessages(welcome.clone())] {
        let f = fired.clone();
        store.subscribe(key.clone(), move |_, _| f.borrow_mut().push(key.clone()));
    }

    let author = CurrentUser {
        id: UserId::from("user-rusty"),
        username: "Rusty".to_string(),
        tag: "4410".to_string(),
        avatar: None,
        status: UserStatus::Online,
    };
    let message = Message::new(welcome.clone(), &author, "o/".to_string());
    store.add_message(&welcome, message.clone());

    assert_eq!(store.messages_for_channel(&welcome).last(), Some(&message));
    assert_eq!(fired.borrow().len(), 2);
}

#[test]
fn selection_survives_restart() {
    let persistence = Rc::new(MemoryPersistence::new());
    {
        let store = store_on(persistence.clone());
        store.set_active_den(&crate::models::DenId::from("den-night-owls"));
        store.set_active_channel(&ChannelId::from("ch-clips"));
        store.set_theme("light", None);
        store.toggle_members_sidebar();
    }

    let store = store_on(persistence);
    assert_eq!(store.active_channel_id(), Some(ChannelId::from("ch-clips")));
    assert_eq!(store.theme(), Theme::Light);
    assert!(!store.members_sidebar_visible());
}

#[test]
fn voice_state_is_not_persisted() {
    let persistence = Rc::new(MemoryPersistence::new());
    {
        let store = store_on(persistence.clone());
        store.join_voice_channel(&ChannelId::from("vc-lounge"));
        store.set_with(StateValue::MicMuted(true), Persist::Yes);
    }

    let store = store_on(persistence);
    assert!(!store.is_connected_to_voice());
    assert!(!store.mic_muted());
    assert_eq!(counter(&store, "vc-lounge"), 0);
}

#[test]
fn sqlite_backed_store_restores_theme() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foxden.db");
    {
        let db = Rc::new(Database::open(&path).unwrap());
        let store = StateStore::new(db, StoreOptions::new());
        store.init();
        store.set_theme("light", None);
    }

    let db = Rc::new(Database::open(&path).unwrap());
    let store = StateStore::new(db, StoreOptions::new());
    store.init();
    assert_eq!(store.theme(), Theme::Light);
}

#[test]
fn failed_persistence_keeps_memory_state() {
    let persistence = Rc::new(MemoryPersistence::new());
    let store = store_on(persistence.clone());
    persistence.set_failing(true);

    store.set_theme("light", None);
    assert_eq!(store.theme(), Theme::Light);
}
