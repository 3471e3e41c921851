//! Voice session control
//!
//! Turns user intents (connect, mute, deafen, camera, screen share) into
//! state store mutations and owns the media streams backing them. The
//! store itself only tracks flags; the cross-field rules live here:
//! - one voice channel at a time, reconnecting to the same one is a no-op
//! - deafening mutes the microphone, undeafening unmutes it
//! - a failed device acquisition falls back to `Off` with a warning
//!
//! The controller also watches the store, so streams are released when
//! voice is left or a stream flag is reset by anyone else (den deletion,
//! a direct `join_voice_channel`).

mod media;

use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use tracing::{debug, info, warn};

use crate::models::ChannelId;
use crate::notify::NotificationGateway;
use crate::state::{Persist, StateKey, StateStore, StateValue, Subscription};

pub use media::{
    AudioHandle, MediaDeviceGateway, MediaError, MediaHandle, MediaKind, MediaState,
    SimulatedDevices, VideoHandle,
};

/// Default capture source for screen sharing
pub const DEFAULT_SCREEN_SOURCE: &str = "screen:0";

/// Snapshot of the local user's voice session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceSession {
    Disconnected,
    Connected {
        channel_id: ChannelId,
        muted: bool,
        deafened: bool,
        video: MediaState,
        screen: MediaState,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Camera,
    Screen,
}

impl Stream {
    fn key(self) -> StateKey {
        match self {
            Stream::Camera => StateKey::VideoEnabled,
            Stream::Screen => StateKey::ScreenShareEnabled,
        }
    }

    fn value(self, state: MediaState) -> StateValue {
        match self {
            Stream::Camera => StateValue::VideoEnabled(state),
            Stream::Screen => StateValue::ScreenShareEnabled(state),
        }
    }
}

/// The device gateway and every handle taken from it
struct Streams<M> {
    media: M,
    microphone: Option<AudioHandle>,
    camera: Option<VideoHandle>,
    screen: Option<VideoHandle>,
}

impl<M: MediaDeviceGateway> Streams<M> {
    fn slot(&mut self, stream: Stream) -> &mut Option<VideoHandle> {
        match stream {
            Stream::Camera => &mut self.camera,
            Stream::Screen => &mut self.screen,
        }
    }

    fn acquire_microphone(&mut self) -> Result<(), MediaError> {
        let handle = self.media.acquire_microphone()?;
        if let Some(old) = self.microphone.replace(handle) {
            self.media.release(MediaHandle::Audio(old));
        }
        Ok(())
    }

    fn acquire(&mut self, stream: Stream, screen_source: &str) -> Result<(), MediaError> {
        let handle = match stream {
            Stream::Camera => self.media.acquire_camera()?,
            Stream::Screen => self.media.acquire_screen(screen_source)?,
        };
        if let Some(old) = self.slot(stream).replace(handle) {
            self.media.release(MediaHandle::Video(old));
        }
        Ok(())
    }

    /// True when a handle was actually held
    fn release(&mut self, stream: Stream) -> bool {
        match self.slot(stream).take() {
            Some(handle) => {
                self.media.release(MediaHandle::Video(handle));
                true
            }
            None => false,
        }
    }

    fn release_all(&mut self) -> bool {
        let mut released = false;
        if let Some(handle) = self.microphone.take() {
            self.media.release(MediaHandle::Audio(handle));
            released = true;
        }
        released |= self.release(Stream::Camera);
        released |= self.release(Stream::Screen);
        released
    }
}

/// Run `f` on the streams if the controller is still alive and not in the
/// middle of a device call
fn with_streams<M>(streams: &Weak<RefCell<Streams<M>>>, f: impl FnOnce(&mut Streams<M>)) {
    let Some(streams) = streams.upgrade() else {
        return;
    };
    match streams.try_borrow_mut() {
        Ok(mut streams) => f(&mut streams),
        Err(_) => debug!("Media streams busy"),
    };
}

pub struct VoiceSessionController<M: MediaDeviceGateway + 'static> {
    store: Rc<StateStore>,
    streams: Rc<RefCell<Streams<M>>>,
    notifier: Rc<dyn NotificationGateway>,
    screen_source: String,
    last_warning: Option<String>,
    watchers: Vec<Subscription>,
}

impl<M: MediaDeviceGateway + 'static> VoiceSessionController<M> {
    pub fn new(store: Rc<StateStore>, media: M, notifier: Rc<dyn NotificationGateway>) -> Self {
        let streams = Rc::new(RefCell::new(Streams {
            media,
            microphone: None,
            camera: None,
            screen: None,
        }));
        let watchers = Self::watch(&store, &streams);
        Self {
            store,
            streams,
            notifier,
            screen_source: DEFAULT_SCREEN_SOURCE.to_string(),
            last_warning: None,
            watchers,
        }
    }

    /// Release handles whose store flags were cleared behind our back
    fn watch(store: &StateStore, streams: &Rc<RefCell<Streams<M>>>) -> Vec<Subscription> {
        let mut watchers = Vec::new();

        let weak = Rc::downgrade(streams);
        watchers.push(store.subscribe(StateKey::ConnectedToVoice, move |new, _| {
            if new.as_bool() == Some(false) {
                with_streams(&weak, |s| {
                    if s.release_all() {
                        info!("Released media after leaving voice");
                    }
                });
            }
        }));

        for stream in [Stream::Camera, Stream::Screen] {
            let weak = Rc::downgrade(streams);
            watchers.push(store.subscribe(stream.key(), move |new, _| {
                if new.as_media_state() == Some(MediaState::Off) {
                    with_streams(&weak, |s| {
                        if s.release(stream) {
                            debug!(?stream, "Released stream reset by the store");
                        }
                    });
                }
            }));
        }
        watchers
    }

    pub fn with_screen_source(mut self, source_id: impl Into<String>) -> Self {
        self.screen_source = source_id.into();
        self
    }

    pub fn media(&self) -> Ref<'_, M> {
        Ref::map(self.streams.borrow(), |s| &s.media)
    }

    pub fn media_mut(&self) -> RefMut<'_, M> {
        RefMut::map(self.streams.borrow_mut(), |s| &mut s.media)
    }

    /// Most recent device warning shown to the user
    pub fn last_warning(&self) -> Option<&str> {
        self.last_warning.as_deref()
    }

    pub fn session(&self) -> VoiceSession {
        match self.store.active_voice_channel_id() {
            Some(channel_id) if self.store.is_connected_to_voice() => VoiceSession::Connected {
                channel_id,
                muted: self.store.mic_muted(),
                deafened: self.store.deafened(),
                video: self.store.video_state(),
                screen: self.store.screen_share_state(),
            },
            _ => VoiceSession::Disconnected,
        }
    }

    /// Join a voice channel, leaving the current one first. Already being
    /// in `channel_id` makes this a no-op.
    pub fn connect(&mut self, channel_id: &ChannelId) {
        if self.store.is_connected_to_voice()
            && self.store.active_voice_channel_id().as_ref() == Some(channel_id)
        {
            debug!(channel_id = %channel_id, "Already connected to voice channel");
            return;
        }
        if !self
            .store
            .find_channel(channel_id)
            .is_some_and(|c| c.is_voice())
        {
            debug!(channel_id = %channel_id, "Not a voice channel");
            return;
        }

        if self.store.is_connected_to_voice() {
            self.disconnect();
        }
        self.store.join_voice_channel(channel_id);

        let acquired = self.streams.borrow_mut().acquire_microphone();
        if let Err(e) = acquired {
            // Stay in the channel, listen-only
            self.store.set_with(StateValue::MicMuted(true), Persist::No);
            self.surface_warning(&e);
        }
        info!(channel_id = %channel_id, "Voice session started");
    }

    /// Leave voice and stop every stream. No-op when disconnected.
    pub fn disconnect(&mut self) {
        if !self.store.is_connected_to_voice() {
            debug!("Voice already disconnected");
            return;
        }
        self.streams.borrow_mut().release_all();
        self.store.leave_voice_channel();
        info!("Voice session ended");
    }

    /// Flip the microphone. Allowed while disconnected, and leaves the
    /// deafen flag alone.
    pub fn toggle_mic(&mut self) -> bool {
        let muted = !self.store.mic_muted();
        self.store.set_with(StateValue::MicMuted(muted), Persist::No);
        self.refresh_channels();
        muted
    }

    /// Flip deafen, carrying the microphone along with it
    pub fn toggle_deafen(&mut self) -> bool {
        let deafened = !self.store.deafened();
        let mut changes = vec![StateValue::Deafened(deafened)];
        if self.store.mic_muted() != deafened {
            changes.push(StateValue::MicMuted(deafened));
        }
        self.store.update_with(changes, Persist::No);
        self.refresh_channels();
        deafened
    }

    pub fn toggle_video(&mut self) -> MediaState {
        self.toggle_stream(Stream::Camera)
    }

    pub fn toggle_screen_share(&mut self) -> MediaState {
        self.toggle_stream(Stream::Screen)
    }

    /// `On` stops the stream. `Off` starts it, and so does `Acquiring`:
    /// a second press while pending simply asks the device again.
    fn toggle_stream(&mut self, stream: Stream) -> MediaState {
        if self.stream_state(stream).is_on() {
            self.streams.borrow_mut().release(stream);
            self.publish(stream, MediaState::Off);
        } else {
            self.publish(stream, MediaState::Acquiring);
            let acquired = self
                .streams
                .borrow_mut()
                .acquire(stream, &self.screen_source);
            match acquired {
                Ok(()) => self.publish(stream, MediaState::On),
                Err(e) => {
                    self.publish(stream, MediaState::Off);
                    self.surface_warning(&e);
                }
            }
        }

        self.refresh_channels();
        self.stream_state(stream)
    }

    fn stream_state(&self, stream: Stream) -> MediaState {
        match stream {
            Stream::Camera => self.store.video_state(),
            Stream::Screen => self.store.screen_share_state(),
        }
    }

    fn publish(&self, stream: Stream, state: MediaState) {
        self.store.set_with(stream.value(state), Persist::No);
    }

    /// Let channel lists redraw counters and per-user icons
    fn refresh_channels(&self) {
        self.store.touch(&StateKey::Channels);
    }

    fn surface_warning(&mut self, error: &MediaError) {
        let title = match error.kind() {
            MediaKind::Microphone => "Microphone access failed",
            MediaKind::Camera => "Camera access failed",
            MediaKind::Screen => "Screen sharing failed",
        };
        warn!(error = %error, "Media acquisition failed");
        self.notifier.notify(title, &error.to_string());
        self.last_warning = Some(format!("{title}: {error}"));
    }
}

impl<M: MediaDeviceGateway + 'static> Drop for VoiceSessionController<M> {
    fn drop(&mut self) {
        for watcher in &self.watchers {
            watcher.unsubscribe();
        }
        self.streams.borrow_mut().release_all();
    }
}
