use serde::Serialize;

use super::similarity::{exact_similarity, string_similarity};
use crate::config::EventFieldWeights;
use crate::model::{EventDate, EventRecord, EventTime};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldScores {
    pub date: f64,
    pub time: f64,
    pub venue: f64,
    pub city: f64,
    pub province: f64,
    pub country: f64,
    pub event_name: f64,
    pub ticket_info: f64,
    pub status: f64,
}

impl FieldScores {
    pub fn compare(gold: &EventRecord, predicted: &EventRecord) -> Self {
        Self {
            date: date_similarity(gold.date.as_ref(), predicted.date.as_ref()),
            time: time_similarity(gold.time.as_ref(), predicted.time.as_ref()),
            venue: string_similarity(gold.venue.as_deref(), predicted.venue.as_deref()),
            city: string_similarity(gold.city.as_deref(), predicted.city.as_deref()),
            province: string_similarity(gold.province.as_deref(), predicted.province.as_deref()),
            country: string_similarity(gold.country.as_deref(), predicted.country.as_deref()),
            event_name: string_similarity(
                gold.event_name.as_deref(),
                predicted.event_name.as_deref(),
            ),
            ticket_info: string_similarity(
                gold.ticket_info.as_deref(),
                predicted.ticket_info.as_deref(),
            ),
            status: exact_similarity(gold.status.as_deref(), predicted.status.as_deref()),
        }
    }

    /// Weighted mean of the field similarities; dividing by the weight total
    /// keeps a perfect pair at exactly 1.0.
    pub fn weighted(&self, weights: &EventFieldWeights) -> f64 {
        let terms = [
            (weights.date, self.date),
            (weights.time, self.time),
            (weights.venue, self.venue),
            (weights.city, self.city),
            (weights.province, self.province),
            (weights.country, self.country),
            (weights.event_name, self.event_name),
            (weights.ticket_info, self.ticket_info),
            (weights.status, self.status),
        ];
        let total_weight = terms.iter().map(|(weight, _)| weight).sum::<f64>();
        if total_weight <= 0.0 {
            return 0.0;
        }
        let weighted = terms
            .iter()
            .map(|(weight, score)| weight * score)
            .sum::<f64>();
        (weighted / total_weight).clamp(0.0, 1.0)
    }

    pub fn location(&self) -> f64 {
        (self.city + self.province + self.country) / 3.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedPair {
    pub gold_index: usize,
    pub predicted_index: usize,
    pub pair_score: f64,
    pub field_scores: FieldScores,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchAssignment {
    pub pairs: Vec<MatchedPair>,
    pub missing_gold: Vec<usize>,
    pub extra_predicted: Vec<usize>,
    pub event_match_score: f64,
}

impl MatchAssignment {
    pub fn gold_count(&self) -> usize {
        self.pairs.len() + self.missing_gold.len()
    }

    /// Sums a per-pair quantity and averages it over the gold events, so
    /// missing gold events count as zero.
    pub fn mean_over_gold(&self, metric: impl Fn(&MatchedPair) -> f64) -> f64 {
        let gold_count = self.gold_count();
        if gold_count == 0 {
            return 0.0;
        }
        self.pairs.iter().map(metric).sum::<f64>() / gold_count as f64
    }
}

/// Optimal one-to-one pairing of gold and predicted events. Always pairs
/// `min(m, n)` events; the score is averaged over the gold count.
pub fn match_events(
    gold: &[EventRecord],
    predicted: &[EventRecord],
    weights: &EventFieldWeights,
) -> MatchAssignment {
    let gold_count = gold.len();
    let predicted_count = predicted.len();

    if gold_count == 0 || predicted_count == 0 {
        let event_match_score = if gold_count == 0 && predicted_count == 0 {
            1.0
        } else {
            0.0
        };
        return MatchAssignment {
            pairs: Vec::new(),
            missing_gold: (0..gold_count).collect(),
            extra_predicted: (0..predicted_count).collect(),
            event_match_score,
        };
    }

    let field_scores = gold
        .iter()
        .map(|gold_event| {
            predicted
                .iter()
                .map(|predicted_event| FieldScores::compare(gold_event, predicted_event))
                .collect::<Vec<FieldScores>>()
        })
        .collect::<Vec<Vec<FieldScores>>>();
    let similarity = field_scores
        .iter()
        .map(|row| {
            row.iter()
                .map(|scores| scores.weighted(weights))
                .collect::<Vec<f64>>()
        })
        .collect::<Vec<Vec<f64>>>();

    let gold_to_predicted = if gold_count <= predicted_count {
        let cost = similarity
            .iter()
            .map(|row| row.iter().map(|score| 1.0 - score).collect::<Vec<f64>>())
            .collect::<Vec<Vec<f64>>>();
        solve_assignment(&cost)
            .into_iter()
            .enumerate()
            .collect::<Vec<(usize, usize)>>()
    } else {
        let cost = (0..predicted_count)
            .map(|column| {
                (0..gold_count)
                    .map(|row| 1.0 - similarity[row][column])
                    .collect::<Vec<f64>>()
            })
            .collect::<Vec<Vec<f64>>>();
        let mut pairs = solve_assignment(&cost)
            .into_iter()
            .enumerate()
            .map(|(predicted_index, gold_index)| (gold_index, predicted_index))
            .collect::<Vec<(usize, usize)>>();
        pairs.sort_unstable();
        pairs
    };

    let mut gold_matched = vec![false; gold_count];
    let mut predicted_matched = vec![false; predicted_count];
    let pairs = gold_to_predicted
        .into_iter()
        .map(|(gold_index, predicted_index)| {
            gold_matched[gold_index] = true;
            predicted_matched[predicted_index] = true;
            MatchedPair {
                gold_index,
                predicted_index,
                pair_score: similarity[gold_index][predicted_index],
                field_scores: field_scores[gold_index][predicted_index],
            }
        })
        .collect::<Vec<MatchedPair>>();

    let total = pairs.iter().map(|pair| pair.pair_score).sum::<f64>();
    MatchAssignment {
        event_match_score: (total / gold_count as f64).clamp(0.0, 1.0),
        missing_gold: unmatched_indices(&gold_matched),
        extra_predicted: unmatched_indices(&predicted_matched),
        pairs,
    }
}

fn unmatched_indices(matched: &[bool]) -> Vec<usize> {
    matched
        .iter()
        .enumerate()
        .filter(|(_, is_matched)| !**is_matched)
        .map(|(index, _)| index)
        .collect()
}

fn date_similarity(gold: Option<&EventDate>, predicted: Option<&EventDate>) -> f64 {
    let gold = gold.filter(|date| !date.raw.trim().is_empty());
    let predicted = predicted.filter(|date| !date.raw.trim().is_empty());
    match (gold, predicted) {
        (None, None) => 1.0,
        (Some(gold), Some(predicted)) => match (gold.canonical, predicted.canonical) {
            (Some(left), Some(right)) if left == right => 1.0,
            _ => 0.0,
        },
        _ => 0.0,
    }
}

fn time_similarity(gold: Option<&EventTime>, predicted: Option<&EventTime>) -> f64 {
    let gold = gold.filter(|time| !time.raw.trim().is_empty());
    let predicted = predicted.filter(|time| !time.raw.trim().is_empty());
    match (gold, predicted) {
        (None, None) => 1.0,
        (Some(gold), Some(predicted)) => match (gold.canonical, predicted.canonical) {
            (Some(left), Some(right)) => {
                if left == right {
                    1.0
                } else {
                    0.0
                }
            }
            (None, None) => {
                exact_similarity(Some(gold.raw.as_str()), Some(predicted.raw.as_str()))
            }
            _ => 0.0,
        },
        _ => 0.0,
    }
}

/// Minimum-cost assignment of every row to a distinct column (Hungarian
/// method with potentials). Requires `rows <= columns`; returns the column
/// chosen for each row.
pub fn solve_assignment(cost: &[Vec<f64>]) -> Vec<usize> {
    let rows = cost.len();
    if rows == 0 {
        return Vec::new();
    }
    let columns = cost[0].len();
    debug_assert!(rows <= columns, "assignment needs rows <= columns");

    let mut row_potential = vec![0.0_f64; rows + 1];
    let mut column_potential = vec![0.0_f64; columns + 1];
    // 1-based; owner[j] is the row holding column j, 0 for none.
    let mut owner = vec![0_usize; columns + 1];
    let mut way = vec![0_usize; columns + 1];

    for row in 1..=rows {
        owner[0] = row;
        let mut current_column = 0_usize;
        let mut min_reduced = vec![f64::INFINITY; columns + 1];
        let mut used = vec![false; columns + 1];

        loop {
            used[current_column] = true;
            let current_row = owner[current_column];
            let mut delta = f64::INFINITY;
            let mut next_column = 0_usize;

            for column in 1..=columns {
                if used[column] {
                    continue;
                }
                let reduced = cost[current_row - 1][column - 1]
                    - row_potential[current_row]
                    - column_potential[column];
                if reduced < min_reduced[column] {
                    min_reduced[column] = reduced;
                    way[column] = current_column;
                }
                if min_reduced[column] < delta {
                    delta = min_reduced[column];
                    next_column = column;
                }
            }

            for column in 0..=columns {
                if used[column] {
                    row_potential[owner[column]] += delta;
                    column_potential[column] -= delta;
                } else {
                    min_reduced[column] -= delta;
                }
            }

            current_column = next_column;
            if owner[current_column] == 0 {
                break;
            }
        }

        loop {
            let previous_column = way[current_column];
            owner[current_column] = owner[previous_column];
            current_column = previous_column;
            if current_column == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0_usize; rows];
    for column in 1..=columns {
        if owner[column] > 0 {
            assignment[owner[column] - 1] = column - 1;
        }
    }
    assignment
}
