/// Number of plant categories tracked by the growth/decay cycle fields.
///
/// Each category occupies one lane of the `Vec4` cycle buffers, so this
/// is fixed at the storage level and not configurable.
pub const CATEGORY_COUNT: usize = 4;

/// Durations at or below this value (in seconds) are treated as
/// infinite: the derived rate is exactly 0 instead of a near-zero
/// division blowing up.
pub const DURATION_EPSILON: f32 = 1e-6;
