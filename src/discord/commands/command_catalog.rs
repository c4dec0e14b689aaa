// Discord commands module.
// Member-facing commands live in `reports`, moderator tooling in `review`.

pub mod choices;

pub mod reports;

pub mod review;
