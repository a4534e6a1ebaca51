pub mod game;
pub mod rsvp;
pub mod user;
