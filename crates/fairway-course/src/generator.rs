//! Row-based course generator.
//!
//! The field is split into horizontal rows between the two reserved
//! bands. Each row independently samples one [`Pattern`] and contributes
//! the pattern's obstacles at that row's (slightly jittered) height.
//!
//! Difficulty comes from two knobs, both monotone in the round number:
//!
//! - [`row_spacing`] shrinks, so later courses have more obstacle rows;
//! - [`candidate_patterns`] grows, so later rows can roll harder patterns.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    FIELD_HEIGHT, FIELD_WIDTH, HOLE_RADIUS, Hole, OBSTACLE_BAND_BOTTOM,
    OBSTACLE_BAND_TOP, Point, ROW_HEIGHT, Rect, WALL_THICKNESS,
};

/// Maximum vertical jitter applied to an obstacle row, in either direction.
const ROW_JITTER: f32 = 6.0;

/// Row spacing of the first round.
const BASE_ROW_SPACING: f32 = 120.0;

/// Spacing lost per round until the minimum is reached.
const ROW_SPACING_STEP: f32 = 20.0;

/// Densest allowed row spacing: one obstacle row per grid row.
const MIN_ROW_SPACING: f32 = ROW_HEIGHT;

/// Patterns available in rounds 1 and 2.
const BASE_PATTERN_COUNT: usize = 4;

/// Width of a [`Pattern::CenterPost`] obstacle.
const POST_WIDTH: f32 = 40.0;

/// Width of a single [`Pattern::Scatter`] block.
const SCATTER_BLOCK_WIDTH: f32 = 30.0;

/// Interior columns a scatter block may land in (one column = 40 units,
/// the outermost columns are left to the boundary walls).
const SCATTER_COLUMNS: usize = 8;

// ---------------------------------------------------------------------------
// CourseLayout
// ---------------------------------------------------------------------------

/// One round's course: hole, start, walls and difficulty.
///
/// `walls` always begins with the four boundary walls (top, bottom, left,
/// right); everything after them is an interior obstacle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseLayout {
    pub hole: Hole,
    pub start: Point,
    pub walls: Vec<Rect>,
    pub round: u32,
    /// Expected number of shots for this hole. Doubles as the shot budget
    /// when a room plays with a shot limit.
    pub par: u32,
}

impl CourseLayout {
    /// The four walls enclosing the field.
    pub fn boundary_walls(&self) -> &[Rect] {
        &self.walls[..4]
    }

    /// Interior obstacles, in row order from the top.
    pub fn obstacles(&self) -> &[Rect] {
        &self.walls[4..]
    }

    /// The whole playing field as a rectangle.
    pub fn field() -> Rect {
        Rect::new(0.0, 0.0, FIELD_WIDTH, FIELD_HEIGHT)
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// The obstacle arrangement of a single row.
///
/// Variants are declared from easiest to hardest; [`candidate_patterns`]
/// unlocks them in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// No obstacle in this row.
    Empty,
    /// A wall from the left edge to 40% of the width.
    LeftWall,
    /// A wall from 60% of the width to the right edge.
    RightWall,
    /// A block across the middle 40%, open on both sides.
    CenterBlock,
    /// Two side walls with a gate in the middle.
    Split,
    /// A single small post in the center.
    CenterPost,
    /// Two or three small blocks in random columns.
    Scatter,
}

impl Pattern {
    /// Every pattern, easiest first.
    pub const CATALOG: [Pattern; 7] = [
        Pattern::Empty,
        Pattern::LeftWall,
        Pattern::RightWall,
        Pattern::CenterBlock,
        Pattern::Split,
        Pattern::CenterPost,
        Pattern::Scatter,
    ];

    /// Builds this pattern's obstacles with their top edge at `y`.
    pub fn obstacles<R: Rng + ?Sized>(self, y: f32, rng: &mut R) -> Vec<Rect> {
        let w = FIELD_WIDTH;
        let h = WALL_THICKNESS;
        match self {
            Pattern::Empty => Vec::new(),
            Pattern::LeftWall => vec![Rect::new(0.0, y, w * 0.4, h)],
            Pattern::RightWall => vec![Rect::new(w * 0.6, y, w * 0.4, h)],
            Pattern::CenterBlock => vec![Rect::new(w * 0.3, y, w * 0.4, h)],
            Pattern::Split => vec![
                Rect::new(0.0, y, w * 0.3, h),
                Rect::new(w * 0.7, y, w * 0.3, h),
            ],
            Pattern::CenterPost => {
                vec![Rect::new((w - POST_WIDTH) / 2.0, y, POST_WIDTH, h)]
            }
            Pattern::Scatter => {
                let count = rng.random_range(2..=3);
                let column_width = FIELD_WIDTH / 10.0;
                let inset = (column_width - SCATTER_BLOCK_WIDTH) / 2.0;
                let mut columns: Vec<usize> =
                    rand::seq::index::sample(rng, SCATTER_COLUMNS, count)
                        .into_iter()
                        .collect();
                columns.sort_unstable();
                columns
                    .into_iter()
                    .map(|col| {
                        let x = column_width * (col + 1) as f32 + inset;
                        Rect::new(x, y, SCATTER_BLOCK_WIDTH, h)
                    })
                    .collect()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Difficulty curve
// ---------------------------------------------------------------------------

/// Patterns a row may roll in `round`. Never shrinks as rounds go up.
pub fn candidate_patterns(round: u32) -> &'static [Pattern] {
    let round = round.max(1);
    let unlocked = BASE_PATTERN_COUNT + ((round - 1) / 2) as usize;
    &Pattern::CATALOG[..unlocked.min(Pattern::CATALOG.len())]
}

/// Vertical distance between obstacle rows in `round`. Never grows as
/// rounds go up.
pub fn row_spacing(round: u32) -> f32 {
    let steps = round.max(1).saturating_sub(1).min(4);
    (BASE_ROW_SPACING - ROW_SPACING_STEP * steps as f32).max(MIN_ROW_SPACING)
}

/// Par for `round`: three shots, plus one every two rounds.
pub fn par_for_round(round: u32) -> u32 {
    3 + round.max(1) / 2
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generates the course for `round` using the thread-local RNG.
///
/// Round numbers start at 1; `0` is treated as `1`.
pub fn generate(round: u32) -> CourseLayout {
    generate_with(round, &mut rand::rng())
}

/// Generates the course for `round` with a caller-supplied RNG.
pub fn generate_with<R: Rng + ?Sized>(round: u32, rng: &mut R) -> CourseLayout {
    let round = round.max(1);

    let mut walls = boundary_walls();

    let spacing = row_spacing(round);
    let patterns = candidate_patterns(round);
    let lowest_row = OBSTACLE_BAND_BOTTOM - WALL_THICKNESS;

    let mut row_y = OBSTACLE_BAND_TOP;
    while row_y <= lowest_row {
        let pattern = patterns[rng.random_range(0..patterns.len())];
        let jitter = rng.random_range(-ROW_JITTER..=ROW_JITTER);
        let y = (row_y + jitter).clamp(OBSTACLE_BAND_TOP, lowest_row);
        walls.extend(pattern.obstacles(y, rng));
        row_y += spacing;
    }

    CourseLayout {
        hole: Hole {
            x: FIELD_WIDTH / 2.0,
            y: ROW_HEIGHT * 2.0,
            radius: HOLE_RADIUS,
        },
        start: Point::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT - ROW_HEIGHT * 2.5),
        walls,
        round,
        par: par_for_round(round),
    }
}

fn boundary_walls() -> Vec<Rect> {
    let t = WALL_THICKNESS;
    vec![
        Rect::new(0.0, 0.0, FIELD_WIDTH, t),
        Rect::new(0.0, FIELD_HEIGHT - t, FIELD_WIDTH, t),
        Rect::new(0.0, 0.0, t, FIELD_HEIGHT),
        Rect::new(FIELD_WIDTH - t, 0.0, t, FIELD_HEIGHT),
    ]
}
