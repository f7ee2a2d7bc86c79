pub mod birthday;
pub mod helper;
pub mod media;

use crate::{types::Data, types::Error};

type CommandVec = Vec<poise::Command<Data, Error>>;

pub fn all_commands() -> CommandVec {
    let mut commands = Vec::new();

    commands.extend(birthday::birthday_commands());
    commands.extend(helper::helper_commands());
    commands.extend(media::media_commands());

    commands
}
