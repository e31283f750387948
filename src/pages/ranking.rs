use crate::models::Card;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Running best-so-far sets, updated one card at a time in encounter order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Ranking {
    pub max_rating: Option<f64>,
    pub min_price: Option<f64>,
    /// Every card tied at `max_rating`
    pub highest_rated: Vec<Card>,
    /// Every card tied at `min_price`
    pub cheapest: Vec<Card>,
    /// Most-reviewed card among `highest_rated`; first seen wins ties
    pub best_overall: Option<Card>,
}

impl Ranking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cards<'a>(cards: impl IntoIterator<Item = &'a Card>) -> Self {
        let mut ranking = Self::new();
        for card in cards {
            ranking.push(card);
        }
        ranking
    }

    pub fn push(&mut self, card: &Card) {
        self.track_price(card);
        if let Some(rating) = card.rating {
            self.track_rating(card, rating);
        }
    }

    fn track_price(&mut self, card: &Card) {
        match self.min_price {
            Some(min) if card.price > min => {}
            Some(min) if card.price == min => self.cheapest.push(card.clone()),
            _ => {
                self.min_price = Some(card.price);
                self.cheapest = vec![card.clone()];
            }
        }
    }

    fn track_rating(&mut self, card: &Card, rating: f64) {
        match self.max_rating {
            Some(max) if rating < max => {}
            Some(max) if rating == max => {
                self.highest_rated.push(card.clone());
                if more_reviewed(card, self.best_overall.as_ref()) {
                    self.best_overall = Some(card.clone());
                }
            }
            _ => {
                self.max_rating = Some(rating);
                self.highest_rated = vec![card.clone()];
                self.best_overall = card.reviews.map(|_| card.clone());
            }
        }
    }
}

/// True when `card` has strictly more reviews than the current best
fn more_reviewed(card: &Card, best: Option<&Card>) -> bool {
    match (card.reviews, best.and_then(|b| b.reviews)) {
        (Some(reviews), Some(best_reviews)) => reviews > best_reviews,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Log each card on its own line
pub fn log_cards(cards: &[Card]) {
    for c in cards {
        info!(
            "Rating: {:?} Price: {} Reviews: {:?} Url: {}",
            c.rating,
            c.price,
            c.reviews,
            c.url.as_deref().unwrap_or("-")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(rating: Option<f64>, price: f64, reviews: Option<u32>) -> Card {
        Card {
            rating,
            price,
            reviews,
            url: None,
        }
    }

    #[test]
    fn ties_on_rating_pick_most_reviewed() {
        let cards = vec![
            card(Some(4.5), 100.0, Some(10)),
            card(Some(4.5), 80.0, Some(30)),
            card(Some(4.0), 80.0, Some(50)),
        ];
        let ranking = Ranking::from_cards(&cards);

        assert_eq!(ranking.highest_rated, cards[..2].to_vec());
        assert_eq!(ranking.cheapest, cards[1..].to_vec());
        assert_eq!(ranking.best_overall, Some(cards[1].clone()));
        assert_eq!(ranking.max_rating, Some(4.5));
        assert_eq!(ranking.min_price, Some(80.0));
    }

    #[test]
    fn unrated_card_only_counts_for_price() {
        let cards = vec![card(None, 120.0, None)];
        let ranking = Ranking::from_cards(&cards);

        assert!(ranking.highest_rated.is_empty());
        assert_eq!(ranking.cheapest, cards);
        assert_eq!(ranking.best_overall, None);
    }

    #[test]
    fn higher_rating_resets_best_overall() {
        let cards = vec![
            card(Some(4.2), 90.0, Some(400)),
            card(Some(4.9), 150.0, None),
            card(Some(4.9), 140.0, Some(3)),
        ];
        let ranking = Ranking::from_cards(&cards);

        assert_eq!(ranking.highest_rated, cards[1..].to_vec());
        assert_eq!(ranking.best_overall, Some(cards[2].clone()));
        assert_eq!(ranking.cheapest, vec![cards[0].clone()]);
    }

    #[test]
    fn first_seen_wins_review_ties() {
        let a = card(Some(5.0), 200.0, Some(7)).with_url("https://www.airbnb.com/rooms/1");
        let b = card(Some(5.0), 210.0, Some(7)).with_url("https://www.airbnb.com/rooms/2");
        let ranking = Ranking::from_cards([&a, &b]);
        assert_eq!(ranking.best_overall, Some(a));
    }

    #[test]
    fn best_overall_dominates_highest_rated() {
        let cards: Vec<Card> = (0..40u32)
            .map(|i| {
                let rating = [4.6, 4.8, 4.8, 4.7][(i % 4) as usize];
                let reviews = if i % 5 == 0 { None } else { Some((i * 37) % 23) };
                card(Some(rating), 50.0 + f64::from((i * 13) % 17), reviews)
            })
            .collect();
        let ranking = Ranking::from_cards(&cards);

        let max = cards.iter().filter_map(|c| c.rating).fold(f64::MIN, f64::max);
        assert!(ranking.highest_rated.iter().all(|c| c.rating == Some(max)));
        assert_eq!(
            ranking.highest_rated.len(),
            cards.iter().filter(|c| c.rating == Some(max)).count()
        );

        let min = cards.iter().map(|c| c.price).fold(f64::MAX, f64::min);
        assert!(!ranking.cheapest.is_empty());
        assert!(ranking.cheapest.iter().all(|c| c.price == min));

        let best = ranking.best_overall.clone().unwrap();
        assert!(ranking.highest_rated.contains(&best));
        let best_reviews = best.reviews.unwrap();
        assert!(ranking
            .highest_rated
            .iter()
            .filter_map(|c| c.reviews)
            .all(|r| r <= best_reviews));
    }

    #[test]
    fn empty_input() {
        let cards: Vec<Card> = Vec::new();
        let ranking = Ranking::from_cards(&cards);
        assert_eq!(ranking, Ranking::default());
    }
}
