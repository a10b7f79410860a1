use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    /// Canonical order, also used to break ties between equal probabilities.
    pub const ALL: [Outcome; 3] = [Outcome::Home, Outcome::Draw, Outcome::Away];

    /// Class index convention shared by every model provider: 0=Away, 1=Draw, 2=Home.
    pub fn from_class_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Outcome::Away),
            1 => Some(Outcome::Draw),
            2 => Some(Outcome::Home),
            _ => None,
        }
    }

    pub fn class_index(self) -> usize {
        match self {
            Outcome::Away => 0,
            Outcome::Draw => 1,
            Outcome::Home => 2,
        }
    }

    /// Betting-slip symbol: `1` home, `X` draw, `2` away.
    pub fn symbol(self) -> char {
        match self {
            Outcome::Home => '1',
            Outcome::Draw => 'X',
            Outcome::Away => '2',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Home => "Home",
            Outcome::Draw => "Draw",
            Outcome::Away => "Away",
        }
    }

    pub fn from_goals(home_goals: i32, away_goals: i32) -> Self {
        if home_goals > away_goals {
            Outcome::Home
        } else if home_goals < away_goals {
            Outcome::Away
        } else {
            Outcome::Draw
        }
    }

    pub(crate) fn rank(self) -> usize {
        match self {
            Outcome::Home => 0,
            Outcome::Draw => 1,
            Outcome::Away => 2,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Home/draw/away probabilities. Every transformation returns a new vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityVector {
    #[serde(rename = "Home")]
    pub home: f64,
    #[serde(rename = "Draw")]
    pub draw: f64,
    #[serde(rename = "Away")]
    pub away: f64,
}

impl ProbabilityVector {
    pub fn new(home: f64, draw: f64, away: f64) -> Self {
        Self { home, draw, away }
    }

    pub fn uniform() -> Self {
        Self {
            home: 1.0 / 3.0,
            draw: 1.0 / 3.0,
            away: 1.0 / 3.0,
        }
    }

    /// Builds a vector from `[p_away, p_draw, p_home]`.
    pub fn from_class_probs(probs: [f64; 3]) -> Self {
        Self {
            home: probs[Outcome::Home.class_index()],
            draw: probs[Outcome::Draw.class_index()],
            away: probs[Outcome::Away.class_index()],
        }
    }

    /// Converts a 0-100 percentage vector onto the unit scale.
    pub fn from_percent_scale(percent: Self) -> Self {
        percent.map(|p| p / 100.0)
    }

    pub fn get(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Home => self.home,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away,
        }
    }

    pub fn values(&self) -> [f64; 3] {
        [self.home, self.draw, self.away]
    }

    pub fn sum(&self) -> f64 {
        self.home + self.draw + self.away
    }

    pub fn max(&self) -> f64 {
        self.home.max(self.draw).max(self.away)
    }

    pub fn min(&self) -> f64 {
        self.home.min(self.draw).min(self.away)
    }

    /// Distance between the largest and smallest entries.
    pub fn spread(&self) -> f64 {
        self.max() - self.min()
    }

    pub fn is_finite(&self) -> bool {
        self.home.is_finite() && self.draw.is_finite() && self.away.is_finite()
    }

    /// Most likely outcome; ties resolve in `Outcome::ALL` order.
    pub fn argmax(&self) -> Outcome {
        let mut best = Outcome::Home;
        for outcome in Outcome::ALL {
            if self.get(outcome) > self.get(best) {
                best = outcome;
            }
        }
        best
    }

    /// Outcomes sorted by descending probability, ties in canonical order.
    pub fn ranked(&self) -> [(Outcome, f64); 3] {
        let mut out = Outcome::ALL.map(|o| (o, self.get(o)));
        out.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.rank().cmp(&b.0.rank())));
        out
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            home: f(self.home),
            draw: f(self.draw),
            away: f(self.away),
        }
    }

    /// Weighted linear blend `self * self_weight + other * other_weight`.
    pub fn blend(&self, other: &Self, self_weight: f64, other_weight: f64) -> Self {
        Self {
            home: self.home * self_weight + other.home * other_weight,
            draw: self.draw * self_weight + other.draw * other_weight,
            away: self.away * self_weight + other.away * other_weight,
        }
    }
}
