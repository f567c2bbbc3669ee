pub mod detect_forks;
pub mod watch;
