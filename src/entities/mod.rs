pub mod country;
pub mod episode;
pub mod episode_server;
pub mod genre;
pub mod movie;
pub mod movie_country;
pub mod movie_genre;
pub mod movie_type;
pub mod session;
pub mod user;
pub mod user_interaction;
pub mod watch_history;
