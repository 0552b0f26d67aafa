use poise::serenity_prelude as serenity;
use serenity::all::{ButtonStyle, CreateActionRow, CreateButton, ReactionType};

use super::playback_engine::PlayerStatus;

/// Every player button id starts with this prefix
pub const BUTTON_PREFIX: &str = "music_";

/// The buttons of the player control message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerButton {
    Next,
    /// Pause when playing, resume when paused
    TogglePause,
    Leave,
    /// Repeat the whole queue
    Repeat,
    Queue,
    Mix,
    /// Re-render the control message
    Controls,
    /// Repeat the current track
    Loop,
}

impl PlayerButton {
    pub const ALL: [PlayerButton; 8] = [
        PlayerButton::Next,
        PlayerButton::TogglePause,
        PlayerButton::Leave,
        PlayerButton::Repeat,
        PlayerButton::Queue,
        PlayerButton::Mix,
        PlayerButton::Controls,
        PlayerButton::Loop,
    ];

    pub fn custom_id(self) -> &'static str {
        match self {
            PlayerButton::Next => "music_next",
            PlayerButton::TogglePause => "music_pause",
            PlayerButton::Leave => "music_leave",
            PlayerButton::Repeat => "music_repeat",
            PlayerButton::Queue => "music_queue",
            PlayerButton::Mix => "music_mix",
            PlayerButton::Controls => "music_controls",
            PlayerButton::Loop => "music_loop",
        }
    }

    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|button| button.custom_id() == custom_id)
    }
}

fn button(id: PlayerButton, emoji: &str, label: &str, style: ButtonStyle) -> CreateButton {
    CreateButton::new(id.custom_id())
        .emoji(ReactionType::Unicode(emoji.to_string()))
        .style(style)
        .label(label)
}

/// Creates the two rows of player buttons for the given transport state
pub fn create_player_buttons(status: PlayerStatus, has_track: bool) -> Vec<CreateActionRow> {
    let (pause_emoji, pause_label) = match status {
        PlayerStatus::Paused => ("▶️", "Resume"),
        _ => ("⏸️", "Pause"),
    };

    let transport = vec![
        button(PlayerButton::Next, "⏭️", "Next", ButtonStyle::Primary).disabled(!has_track),
        button(PlayerButton::TogglePause, pause_emoji, pause_label, ButtonStyle::Primary)
            .disabled(!has_track),
        button(PlayerButton::Leave, "⏹️", "Leave", ButtonStyle::Danger),
        button(PlayerButton::Repeat, "🔁", "Repeat", ButtonStyle::Secondary),
    ];

    let queue = vec![
        button(PlayerButton::Queue, "📋", "Queue", ButtonStyle::Secondary),
        button(PlayerButton::Mix, "🔀", "Shuffle", ButtonStyle::Secondary),
        button(PlayerButton::Controls, "🔄", "Controls", ButtonStyle::Secondary),
        button(PlayerButton::Loop, "🔂", "Loop", ButtonStyle::Secondary),
    ];

    vec![
        CreateActionRow::Buttons(transport),
        CreateActionRow::Buttons(queue),
    ]
}
