//! Canned reply texts.

pub const GREETING_REACTION: &str = "robot_face";
pub const NOT_HAPPY_REACTION: &str = "camel";

pub const NAME_UNKNOWN: &str = "I do not know your name yet!";
pub const ASK_NICKNAME: &str = "What should I call you?";
pub const DOSSIER_UPDATE: &str = "OK! I will update my dossier...";
pub const NEVERMIND: &str = "OK, nevermind!";

pub const CONFIRM_SHUTDOWN: &str = "Are you sure you want me to shutdown?";
pub const FAREWELL: &str = "Bye!";
pub const SHUTDOWN_DISMISSED: &str = "*Phew!*";

pub const ASK_HAPPINESS: &str = "Ben je blij?";
pub const HAPPY_ACK: &str = "ideaal!";
pub const UNHAPPY_ACK: &str = "oei, dat is spijtig";
pub const HAPPINESS_UNKNOWN: &str = "Ik heb geen idee.";

pub fn hello(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("Hello {name}!!"),
        None => "Hello.".to_string(),
    }
}

pub fn nickname_saved(name: &str) -> String {
    format!("Got it. I will call you {name} from now on.")
}

pub fn your_name_is(name: &str) -> String {
    format!("Your name is {name}")
}

pub fn confirm_nickname(nickname: &str) -> String {
    format!("You want me to call you `{nickname}`?")
}

pub fn identity(bot_name: &str, uptime: &str, hostname: &str) -> String {
    format!(
        ":robot_face: I am a bot named <@{bot_name}>. I have been running for {uptime} on {hostname}."
    )
}

pub fn not_happy(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{name} niet blij?"),
        None => "Ben je niet blij?".to_string(),
    }
}

pub fn was_happy(blij: bool) -> String {
    format!("U was {}", if blij { "blij" } else { "niet blij" })
}

pub fn team_happiness(happy: usize, unhappy: usize, unknown: usize) -> String {
    format!(
        "Van het team zijn er {happy} blij, {unhappy} niet blij. Van {unknown} teamleden weet ik het niet."
    )
}
