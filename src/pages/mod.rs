pub mod home;
pub mod parser;
pub mod ranking;
pub mod reservation;
pub mod results;
pub mod types;

pub use home::HomePage;
pub use parser::CardParser;
pub use ranking::{log_cards, Ranking};
pub use reservation::ReservationPage;
pub use results::{Aggregation, ResultsPage};
pub use types::{Guests, SearchParams};
