//! Procedural course generation for Fairway.
//!
//! Every round of a match is played on a freshly generated
//! [`CourseLayout`]: a hole near the top of the field, a start position
//! near the bottom, four boundary walls, and rows of obstacles in between
//! whose density grows with the round number.
//!
//! Generation is a pure function of the round and a random source:
//!
//! ```rust
//! let layout = fairway_course::generate(3);
//! assert_eq!(layout.round, 3);
//! assert_eq!(layout.boundary_walls().len(), 4);
//! ```

mod generator;
mod geometry;

pub use generator::{
    CourseLayout, Pattern, candidate_patterns, generate, generate_with,
    par_for_round, row_spacing,
};
pub use geometry::{Hole, Point, Rect};

/// Width of the playing field in world units.
pub const FIELD_WIDTH: f32 = 400.0;

/// Height of the playing field in world units.
pub const FIELD_HEIGHT: f32 = 800.0;

/// Thickness of the boundary walls and of every obstacle row.
pub const WALL_THICKNESS: f32 = 20.0;

/// Height of one grid row. The field is 20 rows tall.
pub const ROW_HEIGHT: f32 = FIELD_HEIGHT / 20.0;

/// Number of grid rows kept free of obstacles at each end of the field.
pub const RESERVED_ROWS: u32 = 3;

/// Capture radius of the hole.
pub const HOLE_RADIUS: f32 = 18.0;

/// Top edge of the obstacle band. Nothing but boundary walls above this.
pub const OBSTACLE_BAND_TOP: f32 = ROW_HEIGHT * RESERVED_ROWS as f32;

/// Bottom edge of the obstacle band. Nothing but boundary walls below this.
pub const OBSTACLE_BAND_BOTTOM: f32 =
    FIELD_HEIGHT - ROW_HEIGHT * RESERVED_ROWS as f32;
