// Copyright 2026 Hypermesh Foundation. All rights reserved.
// WSN Lifetime Simulation Suite ("The Field") - Topology Input

use rand::Rng;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::types::Position;

/// A parsed deployment: sink position plus one position per sensor.
///
/// Text format: line 1 carries the sensor count, line 2 the sink's two
/// coordinates, then one coordinate pair per sensor. Pairs may be separated
/// by whitespace or commas and may carry stray quotes. Blank lines are
/// skipped without consuming a sensor slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Topology {
    pub sink: Position,
    pub sensors: Vec<Position>,
}

impl Topology {
    pub fn parse(input: &str) -> Result<Self, TopologyError> {
        let mut lines = input.lines().enumerate();

        let (_, count_line) = lines.next().ok_or(TopologyError::Empty)?;
        let declared: usize = count_line.trim().parse().map_err(|_| TopologyError::BadCount {
            found: count_line.trim().to_string(),
        })?;

        let (sink_no, sink_line) = lines.next().ok_or(TopologyError::MissingSink)?;
        let sink = parse_pair(sink_line, sink_no + 1)?;

        let mut sensors = Vec::with_capacity(declared);
        for (no, line) in lines {
            if sensors.len() == declared {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            sensors.push(parse_pair(line, no + 1)?);
        }

        if sensors.len() != declared {
            return Err(TopologyError::CountMismatch {
                declared,
                found: sensors.len(),
            });
        }

        Ok(Self { sink, sensors })
    }

    /// Uniform random deployment over a `width` x `height` field.
    pub fn random<R: Rng>(
        count: usize,
        width: f64,
        height: f64,
        sink: Position,
        rng: &mut R,
    ) -> Self {
        let sensors = (0..count)
            .map(|_| Position::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height)))
            .collect();
        Self { sink, sensors }
    }

    pub fn node_count(&self) -> usize {
        self.sensors.len()
    }
}

/// One coordinate pair; tolerates quotes, commas, and extra columns.
fn parse_pair(raw: &str, line_no: usize) -> Result<Position, TopologyError> {
    let cleaned = raw.replace(['"', '\''], "").replace(',', " ");
    let err = || TopologyError::BadCoordinates {
        line: line_no,
        found: raw.trim().to_string(),
    };
    let mut parts = cleaned.split_whitespace();
    let x: f64 = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    let y: f64 = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    Ok(Position::new(x, y))
}

#[derive(Debug, Error, PartialEq)]
pub enum TopologyError {
    #[error("empty topology input")]
    Empty,
    #[error("invalid sensor count on line 1: {found:?}")]
    BadCount { found: String },
    #[error("missing sink coordinates on line 2")]
    MissingSink,
    #[error("line {line}: expected two coordinates, found {found:?}")]
    BadCoordinates { line: usize, found: String },
    #[error("declared {declared} sensors but input provides {found}")]
    CountMismatch { declared: usize, found: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_parses_mixed_separators_and_quotes() {
        let input = "3\n\"50, 50\"\n10 20\n30,40\n'70' '80'\n";
        let topo = Topology::parse(input).unwrap();
        assert_eq!(topo.sink, Position::new(50.0, 50.0));
        assert_eq!(
            topo.sensors,
            vec![
                Position::new(10.0, 20.0),
                Position::new(30.0, 40.0),
                Position::new(70.0, 80.0),
            ]
        );
    }

    #[test]
    fn test_blank_lines_do_not_consume_sensor_slots() {
        let input = "2\n0 0\n\n10 10\n\n\n20 20\n";
        let topo = Topology::parse(input).unwrap();
        assert_eq!(topo.node_count(), 2);
        assert_eq!(topo.sensors[1], Position::new(20.0, 20.0));
    }

    #[test]
    fn test_trailing_lines_beyond_count_are_ignored() {
        let input = "1\n0 0\n10 10\n99 99\n";
        let topo = Topology::parse(input).unwrap();
        assert_eq!(topo.sensors, vec![Position::new(10.0, 10.0)]);
    }

    #[test]
    fn test_short_input_is_a_count_mismatch() {
        let input = "3\n0 0\n10 10\n";
        assert_eq!(
            Topology::parse(input),
            Err(TopologyError::CountMismatch { declared: 3, found: 1 })
        );
    }

    #[test]
    fn test_bad_count_line() {
        let err = Topology::parse("many\n0 0\n").unwrap_err();
        assert_eq!(err, TopologyError::BadCount { found: "many".into() });
    }

    #[test]
    fn test_missing_sink_line() {
        assert_eq!(Topology::parse("4\n"), Err(TopologyError::MissingSink));
        assert_eq!(Topology::parse(""), Err(TopologyError::Empty));
    }

    #[test]
    fn test_unparsable_coordinates_name_the_line() {
        let input = "2\n0 0\n10 10\nnorth west\n";
        match Topology::parse(input) {
            Err(TopologyError::BadCoordinates { line, found }) => {
                assert_eq!(line, 4);
                assert_eq!(found, "north west");
            }
            other => panic!("expected BadCoordinates, got {:?}", other),
        }
    }

    #[test]
    fn test_single_coordinate_is_rejected() {
        let input = "1\n0 0\n42\n";
        assert!(matches!(
            Topology::parse(input),
            Err(TopologyError::BadCoordinates { line: 3, .. })
        ));
    }

    #[test]
    fn test_random_deployment_respects_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let topo = Topology::random(200, 100.0, 50.0, Position::new(50.0, 25.0), &mut rng);
        assert_eq!(topo.node_count(), 200);
        for p in &topo.sensors {
            assert!((0.0..100.0).contains(&p.x));
            assert!((0.0..50.0).contains(&p.y));
        }
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let err = Topology::parse("3\n0 0\n1 1\n").unwrap_err();
        assert_eq!(err.to_string(), "declared 3 sensors but input provides 1");
    }
}
