//! Line-oriented developer console
//!
//! Drives the store and voice controller from stdin so the headless host
//! can be poked at by hand.

use std::io::{self, BufRead, Write};

use foxden_core::{
    ChannelId, ChannelKind, DenId, MessageId, NotificationGateway, UserStatus, VoiceSession,
};

use crate::state::AppState;

/// Prints notifications to stderr
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl NotificationGateway for ConsoleNotifier {
    fn notify(&self, title: &str, body: &str) {
        eprintln!("** {title}: {body}");
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Dens,
    SelectDen(DenId),
    Channels,
    SelectChannel(ChannelId),
    Messages,
    Say(String),
    Edit(MessageId, String),
    Delete(MessageId),
    React(MessageId, String),
    Members,
    Status(UserStatus),
    NewDen(String),
    NewChannel(ChannelKind, String),
    Join(ChannelId),
    Leave,
    Mute,
    Deafen,
    Video,
    Screen,
    Session,
    Theme(String),
    Sidebar,
    Quit,
}

const HELP: &str = "\
dens | den <id> | channels | select <channel> | messages
say <text> | edit <msg> <text> | delete <msg> | react <msg> <emoji>
members | status <online|idle|dnd|offline>
new-den <name> | new-channel <text|voice> <name>
join <voice channel> | leave | mute | deafen | video | screen | session
theme <dark|light> | sidebar | quit";

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "help" | "?" => Command::Help,
            "dens" => Command::Dens,
            "den" => Command::SelectDen(DenId::from(required(rest, "den <id>")?)),
            "channels" => Command::Channels,
            "select" => Command::SelectChannel(ChannelId::from(required(rest, "select <channel>")?)),
            "messages" => Command::Messages,
            "say" => Command::Say(required(rest, "say <text>")?.to_string()),
            "edit" => {
                let (id, text) = pair(rest, "edit <msg> <text>")?;
                Command::Edit(MessageId::from(id), text.to_string())
            }
            "delete" => Command::Delete(MessageId::from(required(rest, "delete <msg>")?)),
            "react" => {
                let (id, emoji) = pair(rest, "react <msg> <emoji>")?;
                Command::React(MessageId::from(id), emoji.to_string())
            }
            "members" => Command::Members,
            "status" => Command::Status(
                UserStatus::parse(rest).ok_or(CommandError::Usage("status <online|idle|dnd|offline>"))?,
            ),
            "new-den" => Command::NewDen(required(rest, "new-den <name>")?.to_string()),
            "new-channel" => {
                let (kind, name) = pair(rest, "new-channel <text|voice> <name>")?;
                let kind = ChannelKind::parse(kind)
                    .ok_or(CommandError::Usage("new-channel <text|voice> <name>"))?;
                Command::NewChannel(kind, name.to_string())
            }
            "join" => Command::Join(ChannelId::from(required(rest, "join <voice channel>")?)),
            "leave" => Command::Leave,
            "mute" => Command::Mute,
            "deafen" => Command::Deafen,
            "video" => Command::Video,
            "screen" => Command::Screen,
            "session" => Command::Session,
            "theme" => Command::Theme(required(rest, "theme <dark|light>")?.to_string()),
            "sidebar" => Command::Sidebar,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn required<'a>(rest: &'a str, usage: &'static str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(rest)
    }
}

fn pair<'a>(rest: &'a str, usage: &'static str) -> Result<(&'a str, &'a str), CommandError> {
    rest.split_once(char::is_whitespace)
        .map(|(a, b)| (a, b.trim()))
        .filter(|(_, b)| !b.is_empty())
        .ok_or(CommandError::Usage(usage))
}

/// Read commands until `quit` or end of input
pub fn run(state: &mut AppState, input: impl BufRead, mut out: impl Write) -> io::Result<()> {
    writeln!(out, "foxden console, 'help' for commands")?;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => execute(state, command, &mut out)?,
            Err(e) => writeln!(out, "{e}")?,
        }
    }
    Ok(())
}

pub fn execute(state: &mut AppState, command: Command, out: &mut impl Write) -> io::Result<()> {
    let store = state.store.clone();
    match command {
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Dens => {
            let active = store.active_den_id();
            for den in store.dens() {
                let marker = if Some(&den.id) == active.as_ref() { '*' } else { ' ' };
                writeln!(out, "{marker} {} [{}] {}", den.id, den.initials(), den.name)?;
            }
        }
        Command::SelectDen(id) => {
            store.set_active_den(&id);
            if store.active_den_id().as_ref() != Some(&id) {
                writeln!(out, "no den {id}")?;
            }
        }
        Command::Channels => {
            let Some(den) = store.active_den() else {
                return writeln!(out, "no active den");
            };
            let active = store.active_channel_id();
            for channel in store.channels_for_den(&den.id) {
                let marker = if Some(&channel.id) == active.as_ref() { '*' } else { ' ' };
                if channel.is_voice() {
                    writeln!(
                        out,
                        "{marker} {} 🔊 {} ({} connected)",
                        channel.id, channel.name, channel.connected_users
                    )?;
                } else {
                    writeln!(out, "{marker} {} # {}", channel.id, channel.name)?;
                }
            }
        }
        Command::SelectChannel(id) => {
            if store.find_channel(&id).is_none() {
                return writeln!(out, "no channel {id}");
            }
            store.set_active_channel(&id);
        }
        Command::Messages => {
            let Some(channel) = store.active_channel_id() else {
                return writeln!(out, "no active channel");
            };
            for message in store.messages_for_channel(&channel) {
                let edited = if message.edited { " (edited)" } else { "" };
                writeln!(
                    out,
                    "[{}] {} <{}> {}{edited}",
                    message.format_timestamp(),
                    message.id,
                    message.username,
                    message.content
                )?;
            }
        }
        Command::Say(text) => match store.active_channel_id() {
            Some(channel) => {
                if store.send_message(&channel, &text, None).is_none() {
                    writeln!(out, "message not sent")?;
                }
            }
            None => writeln!(out, "no active channel")?,
        },
        Command::Edit(id, text) => {
            let done = store
                .active_channel_id()
                .is_some_and(|channel| store.edit_message(&channel, &id, &text));
            if !done {
                writeln!(out, "no message {id}")?;
            }
        }
        Command::Delete(id) => {
            let done = store
                .active_channel_id()
                .is_some_and(|channel| store.delete_message(&channel, &id));
            if !done {
                writeln!(out, "no message {id}")?;
            }
        }
        Command::React(id, emoji) => {
            let done = store
                .active_channel_id()
                .is_some_and(|channel| store.toggle_reaction(&channel, &id, &emoji));
            if !done {
                writeln!(out, "no message {id}")?;
            }
        }
        Command::Members => {
            let Some(den) = store.active_den_id() else {
                return writeln!(out, "no active den");
            };
            if !store.members_sidebar_visible() {
                return writeln!(out, "member list hidden, 'sidebar' to show");
            }
            for member in store.members_for_den(&den) {
                let owner = if member.is_owner { " (owner)" } else { "" };
                writeln!(
                    out,
                    "{}#{} {}{owner}",
                    member.username,
                    member.tag,
                    member.status.display_name()
                )?;
            }
        }
        Command::Status(status) => {
            let me = store.current_user();
            let den = store.active_den_id();
            if let (Some(me), Some(den)) = (me, den) {
                store.set_member_status(&den, &me.id, status);
            }
        }
        Command::NewDen(name) => match store.create_den(&name, "") {
            Some(den) => writeln!(out, "created {}", den.id)?,
            None => writeln!(out, "den not created")?,
        },
        Command::NewChannel(kind, name) => {
            let created = store
                .active_den_id()
                .and_then(|den| store.create_channel(&den, &name, kind, None));
            match created {
                Some(channel) => writeln!(out, "created {}", channel.id)?,
                None => writeln!(out, "channel not created")?,
            }
        }
        Command::Join(id) => {
            if !store.find_channel(&id).is_some_and(|c| c.is_voice()) {
                return writeln!(out, "no voice channel {id}");
            }
            state.voice.connect(&id);
        }
        Command::Leave => state.voice.disconnect(),
        Command::Mute => {
            let muted = state.voice.toggle_mic();
            writeln!(out, "microphone {}", if muted { "muted" } else { "live" })?;
        }
        Command::Deafen => {
            let deafened = state.voice.toggle_deafen();
            writeln!(out, "{}", if deafened { "deafened" } else { "undeafened" })?;
        }
        Command::Video => {
            let video = state.voice.toggle_video();
            writeln!(out, "camera {video:?}")?;
        }
        Command::Screen => {
            let screen = state.voice.toggle_screen_share();
            writeln!(out, "screen share {screen:?}")?;
        }
        Command::Session => match state.voice.session() {
            VoiceSession::Disconnected => writeln!(out, "not in voice")?,
            VoiceSession::Connected {
                channel_id,
                muted,
                deafened,
                video,
                screen,
            } => {
                writeln!(
                    out,
                    "in {channel_id}: muted={muted} deafened={deafened} video={video:?} screen={screen:?}"
                )?;
                for member in store.voice_channel_participants(&channel_id) {
                    writeln!(out, "  {}", member.username)?;
                }
            }
        },
        Command::Theme(name) => match store.set_theme(&name, None) {
            Some(transition) => {
                let (remove, add) = transition.class_swap();
                writeln!(out, "theme {remove} -> {add}")?;
            }
            None => writeln!(out, "theme unchanged")?,
        },
        Command::Sidebar => {
            let visible = store.toggle_members_sidebar();
            writeln!(out, "member list {}", if visible { "shown" } else { "hidden" })?;
        }
        Command::Quit => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use foxden_core::MemoryPersistence;
    use std::path::PathBuf;
    use std::rc::Rc;

    fn app() -> AppState {
        let config = AppConfig {
            desktop_notifications: false,
            ..AppConfig::default()
        };
        AppState::with_persistence(Rc::new(MemoryPersistence::new()), &config, PathBuf::from("."))
    }

    fn run_script(state: &mut AppState, script: &str) -> String {
        let mut out = Vec::new();
        run(state, script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse(" dens "), Ok(Command::Dens));
        assert_eq!(
            Command::parse("say hello there"),
            Ok(Command::Say("hello there".to_string()))
        );
        assert_eq!(
            Command::parse("new-channel voice Jam Room"),
            Ok(Command::NewChannel(ChannelKind::Voice, "Jam Room".to_string()))
        );
        assert_eq!(
            Command::parse("status away"),
            Err(CommandError::Usage("status <online|idle|dnd|offline>"))
        );
        assert_eq!(Command::parse("say"), Err(CommandError::Usage("say <text>")));
        assert_eq!(
            Command::parse("dance"),
            Err(CommandError::Unknown("dance".to_string()))
        );
    }

    #[test]
    fn chat_round() {
        let mut state = app();
        let output = run_script(&mut state, "select ch-dev\nsay shipping it\nmessages\n");
        assert!(output.contains("<You> shipping it"));
    }

    #[test]
    fn voice_round() {
        let mut state = app();
        let output = run_script(
            &mut state,
            "join vc-lounge\ndeafen\nsession\nvideo\nleave\nsession\n",
        );
        assert!(output.contains("deafened"));
        assert!(output.contains("in vc-lounge: muted=true deafened=true"));
        assert!(output.contains("camera On"));
        assert!(output.contains("not in voice"));
        assert_eq!(state.voice.media().open_streams(), 0);
    }

    #[test]
    fn stops_at_quit() {
        let mut state = app();
        let output = run_script(&mut state, "theme light\nquit\ntheme dark\n");
        assert!(output.contains("theme theme-dark -> theme-light"));
        assert!(!output.contains("theme-light -> theme-dark"));
    }

    #[test]
    fn reports_bad_input() {
        let mut state = app();
        let output = run_script(&mut state, "join ch-general\nden nowhere\nwhat\n");
        assert!(output.contains("no voice channel ch-general"));
        assert!(output.contains("no den nowhere"));
        assert!(output.contains("unknown command 'what'"));
    }
}
