//
// Control repositories (users, sessions)
pub mod control;
//
// Media repositories (upload intents)
pub mod media;
