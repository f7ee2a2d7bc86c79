pub mod sing;

use crate::{types::Data, types::Error};

type CommandVec = Vec<poise::Command<Data, Error>>;

pub fn media_commands() -> CommandVec {
    vec![sing::sing()]
}
