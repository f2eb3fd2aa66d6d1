use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::convert::TryFrom;

use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{ Serialize, Deserialize };

use crate::chunk::FrameChunk;

/// The order in which pending chunks are handed out.
///
/// The final image does not depend on the mode; only the order in which it
/// fills in does.
///
/// Modes are written by camel-cased name. They are read back from any
/// spelling of the name (`centerToEdge`, `center-to-edge`, `CENTER_TO_EDGE`)
/// or from their position in `ALL`, so `2` also means `CenterToEdge`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ModeRepr")]
pub enum ChunkAllocationMode {
    /// Raster order, top left to bottom right.
    Sequential,
    Random,
    /// Middle of the remaining chunks first.
    CenterToEdge,
    /// Alternately the first and the last remaining chunk.
    EdgeToCenter,
}

impl ChunkAllocationMode {
    pub const ALL: [ChunkAllocationMode; 4] = [
        ChunkAllocationMode::Sequential,
        ChunkAllocationMode::Random,
        ChunkAllocationMode::CenterToEdge,
        ChunkAllocationMode::EdgeToCenter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChunkAllocationMode::Sequential => "sequential",
            ChunkAllocationMode::Random => "random",
            ChunkAllocationMode::CenterToEdge => "center-to-edge",
            ChunkAllocationMode::EdgeToCenter => "edge-to-center",
        }
    }

    /// Builds the policy implementing this mode.
    pub fn policy(&self) -> Box<dyn AllocationPolicy> {
        match self {
            ChunkAllocationMode::Sequential => Box::new(Sequential),
            ChunkAllocationMode::Random => Box::new(Random::new()),
            ChunkAllocationMode::CenterToEdge => Box::new(CenterToEdge),
            ChunkAllocationMode::EdgeToCenter => Box::new(EdgeToCenter),
        }
    }
}

impl fmt::Display for ChunkAllocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChunkAllocationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<ChunkAllocationMode, String> {
        let squash = |name: &str| -> String {
            name.chars()
                .filter(|c| *c != '-' && *c != '_')
                .map(|c| c.to_ascii_lowercase())
                .collect()
        };

        ChunkAllocationMode::ALL.iter()
            .find(|mode| squash(mode.name()) == squash(s))
            .copied()
            .ok_or_else(|| format!(
                "unknown allocation mode '{}' (expected one of: {})",
                s,
                ChunkAllocationMode::ALL.iter()
                    .map(|m| m.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModeRepr {
    Index(u64),
    Name(String),
}

impl TryFrom<ModeRepr> for ChunkAllocationMode {
    type Error = String;

    fn try_from(repr: ModeRepr) -> Result<ChunkAllocationMode, String> {
        match repr {
            ModeRepr::Index(i) => ChunkAllocationMode::ALL.get(i as usize)
                .copied()
                .ok_or_else(|| format!("no allocation mode numbered {}", i)),
            ModeRepr::Name(name) => name.parse(),
        }
    }
}

/// A rule for choosing which pending chunk to render next.
///
/// `take_next` removes exactly one chunk from `pending` and returns it, or
/// returns `None` once `pending` is empty. Calling it until it returns `None`
/// yields every chunk that was pending exactly once.
pub trait AllocationPolicy: Send {
    fn take_next(&mut self, pending: &mut VecDeque<FrameChunk>)
        -> Option<FrameChunk>;
}

pub struct Sequential;

impl AllocationPolicy for Sequential {
    fn take_next(&mut self, pending: &mut VecDeque<FrameChunk>)
        -> Option<FrameChunk> {
        pending.pop_front()
    }
}

pub struct Random {
    rng: StdRng,
}

impl Random {
    pub fn new() -> Random {
        Random { rng: StdRng::from_entropy() }
    }

    /// A random policy with a fixed seed, for reproducible orderings.
    pub fn seeded(seed: u64) -> Random {
        Random { rng: StdRng::seed_from_u64(seed) }
    }
}

impl AllocationPolicy for Random {
    fn take_next(&mut self, pending: &mut VecDeque<FrameChunk>)
        -> Option<FrameChunk> {
        if pending.is_empty() {
            return None;
        }

        let index = self.rng.gen_range(0..pending.len());
        pending.remove(index)
    }
}

pub struct CenterToEdge;

impl AllocationPolicy for CenterToEdge {
    fn take_next(&mut self, pending: &mut VecDeque<FrameChunk>)
        -> Option<FrameChunk> {
        if pending.is_empty() {
            return None;
        }

        pending.remove((pending.len() - 1) / 2)
    }
}

pub struct EdgeToCenter;

impl AllocationPolicy for EdgeToCenter {
    fn take_next(&mut self, pending: &mut VecDeque<FrameChunk>)
        -> Option<FrameChunk> {
        if pending.len() % 2 == 0 {
            pending.pop_front()
        } else {
            pending.pop_back()
        }
    }
}

#[cfg(test)]
fn numbered_chunks(n: u32) -> VecDeque<FrameChunk> {
    (0..n).map(|i| FrameChunk::new(i, 0, 1, 1)).collect()
}

#[cfg(test)]
fn drain(policy: &mut dyn AllocationPolicy, n: u32) -> Vec<u32> {
    let mut pending = numbered_chunks(n);
    let mut order = Vec::new();

    while let Some(chunk) = policy.take_next(&mut pending) {
        order.push(chunk.x_start);
    }

    assert!(pending.is_empty());
    order
}

#[test]
fn every_policy_yields_a_permutation() {
    for mode in ChunkAllocationMode::ALL.iter() {
        for n in 0..40 {
            let mut order = drain(&mut *mode.policy(), n);
            assert_eq!(order.len(), n as usize, "{} with {} chunks", mode, n);

            order.sort_unstable();
            assert_eq!(order, (0..n).collect::<Vec<_>>(), "{}", mode);
        }
    }
}

#[test]
fn sequential_is_raster_order() {
    assert_eq!(drain(&mut Sequential, 5), vec![0, 1, 2, 3, 4]);
}

#[test]
fn center_to_edge_takes_middle_first() {
    // n=5 -> index 2, n=4 -> index 1, n=3 -> index 1, n=2 -> 0, n=1 -> 0
    assert_eq!(drain(&mut CenterToEdge, 5), vec![2, 1, 3, 0, 4]);
}

#[test]
fn edge_to_center_alternates_ends() {
    // odd count takes the back, even count the front
    assert_eq!(drain(&mut EdgeToCenter, 5), vec![4, 0, 3, 1, 2]);
    assert_eq!(drain(&mut EdgeToCenter, 4), vec![0, 3, 1, 2]);
}

#[test]
fn seeded_random_is_reproducible() {
    let a = drain(&mut Random::seeded(7), 20);
    let b = drain(&mut Random::seeded(7), 20);

    assert_eq!(a, b);
}

#[test]
fn empty_pending_set_yields_nothing() {
    for mode in ChunkAllocationMode::ALL.iter() {
        let mut pending = VecDeque::new();
        assert_eq!(mode.policy().take_next(&mut pending), None);
    }
}

#[test]
fn mode_names_parse_back() {
    for mode in ChunkAllocationMode::ALL.iter() {
        assert_eq!(mode.name().parse::<ChunkAllocationMode>(), Ok(*mode));
    }

    assert!("spiral".parse::<ChunkAllocationMode>().is_err());
}

#[test]
fn mode_reads_names_and_numbers() {
    let read = |json: &str| serde_json::from_str::<ChunkAllocationMode>(json);

    assert_eq!(read("\"centerToEdge\"").unwrap(),
        ChunkAllocationMode::CenterToEdge);
    assert_eq!(read("\"EDGE_TO_CENTER\"").unwrap(),
        ChunkAllocationMode::EdgeToCenter);
    assert_eq!(read("0").unwrap(), ChunkAllocationMode::Sequential);
    assert_eq!(read("2").unwrap(), ChunkAllocationMode::CenterToEdge);
    assert!(read("4").is_err());
    assert!(read("\"spiral\"").is_err());

    assert_eq!(serde_json::to_string(&ChunkAllocationMode::EdgeToCenter)
        .unwrap(), "\"edgeToCenter\"");
}

#[test]
fn mode_parses_any_spelling() {
    assert_eq!("Center_To_Edge".parse::<ChunkAllocationMode>(),
        Ok(ChunkAllocationMode::CenterToEdge));
}
