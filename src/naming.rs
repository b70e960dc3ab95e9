//! Centralized naming conventions for vislayer-generated identifiers.
//!
//! Synthetic accumulator keys use a double-underscore prefix/suffix pattern so
//! they can never collide with a channel name. Column names that end up in the
//! generated query or render document (`distance`, mesh `x`/`y`, terrain
//! columns) are plain identifiers because the rendering backend looks them up
//! by those exact names.
//!
//! # Categories
//!
//! - **Step keys**: Keys for query steps written by transforms (`__vislayer_step_<name>__`)
//! - **Synthetic columns**: Columns produced by the render backend's decoders
//! - **Scale names**: Per-layer scale names (`<layer>_<channel>`)
//! - **Sampling constants**: Multiplicative hash used for row sampling

use const_format::concatcp;

// ============================================================================
// Base Building Blocks
// ============================================================================

/// Base prefix for all vislayer accumulator keys
const VISLAYER_PREFIX: &str = "__vislayer_";

/// Suffix for all vislayer keys (double underscore)
const VISLAYER_SUFFIX: &str = "__";

/// Full prefix for query step keys: `__vislayer_step_`
const STEP_PREFIX: &str = concatcp!(VISLAYER_PREFIX, "step_");

// ============================================================================
// Fixed Step Keys
// ============================================================================

/// Key of the sampling step
pub const SAMPLE_STEP: &str = concatcp!(STEP_PREFIX, "sample", VISLAYER_SUFFIX);

/// Key of the row-limit step
pub const LIMIT_STEP: &str = concatcp!(STEP_PREFIX, "limit", VISLAYER_SUFFIX);

// ============================================================================
// Synthetic Columns
// ============================================================================

/// Default dimension name of a 2D cross-section (distance along the cut line)
pub const DISTANCE_COLUMN: &str = "distance";

/// Mesh-decoded horizontal coordinate
pub const MESH_X_COLUMN: &str = "x";

/// Mesh-decoded vertical coordinate
pub const MESH_Y_COLUMN: &str = "y";

/// Terrain profile: distance along the cut line
pub const TERRAIN_DISTANCE_COLUMN: &str = "distance";

/// Terrain profile: sampled elevation
pub const TERRAIN_ELEVATION_COLUMN: &str = "elevation";

// ============================================================================
// Sampling
// ============================================================================

/// Knuth multiplicative hash constant applied to `rowid`
pub const SAMPLE_HASH_MULTIPLIER: u64 = 265_445_761;

/// Modulus of the sampling hash (2^32)
pub const SAMPLE_HASH_MODULUS: u64 = 4_294_967_296;

/// Name of the row identifier column used by the sampling predicate
pub const ROWID_COLUMN: &str = "rowid";

// ============================================================================
// Constructor Functions
// ============================================================================

/// Generate the key of a filter step.
///
/// # Example
/// ```
/// use vislayer::naming;
/// assert_eq!(naming::filter_step(0), "__vislayer_step_filter_0__");
/// ```
pub fn filter_step(index: usize) -> String {
    format!("{}filter_{}{}", STEP_PREFIX, index, VISLAYER_SUFFIX)
}

/// Generate the key of a column projected by a transform (not by a channel).
///
/// # Example
/// ```
/// use vislayer::naming;
/// assert_eq!(
///     naming::transform_projection("crossSection2d", "z"),
///     "__vislayer_step_crossSection2d_z__"
/// );
/// ```
pub fn transform_projection(transform: &str, role: &str) -> String {
    format!("{}{}_{}{}", STEP_PREFIX, transform, role, VISLAYER_SUFFIX)
}

/// Generate the result column of an aggregated field.
///
/// # Example
/// ```
/// use vislayer::naming;
/// assert_eq!(naming::aggregate_column("avg", "ws"), "avg_ws");
/// ```
pub fn aggregate_column(op: &str, field: &str) -> String {
    format!("{}_{}", op, field)
}

/// Generate the name of a scale owned by a layer channel.
///
/// # Example
/// ```
/// use vislayer::naming;
/// assert_eq!(naming::scale_name("wind", "strokeColor"), "wind_strokeColor");
/// ```
pub fn scale_name(layer_name: &str, channel: &str) -> String {
    format!("{}_{}", layer_name, channel)
}

/// Check if an accumulator key was produced by a transform rather than a channel.
///
/// # Example
/// ```
/// use vislayer::naming;
/// assert!(naming::is_step_key(naming::SAMPLE_STEP));
/// assert!(!naming::is_step_key("x"));
/// ```
pub fn is_step_key(key: &str) -> bool {
    key.starts_with(STEP_PREFIX) && key.ends_with(VISLAYER_SUFFIX)
}
