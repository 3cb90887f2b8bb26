pub mod discord;
pub mod fetch;
pub mod interaction;

mod bot;

pub use bot::{Bot, Error, Result, MAX_UPLOAD};

/// Slash command manifest registered with Discord at startup.
pub const COMMANDS: &[u8] = include_bytes!("../commands.json");

#[cfg(test)]
mod tests {
    #[test]
    fn command_manifest_is_valid_json() {
        let commands: serde_json::Value = serde_json::from_slice(super::COMMANDS).unwrap();
        let names: Vec<_> = commands.as_array().unwrap().iter().map(|command| command["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["start_quiz", "next_question", "upload_quiz", "force_quit", "help"]);
    }
}
