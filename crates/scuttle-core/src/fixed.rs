use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Ticks per second. One tick is 100 ms, which makes the countdown status
/// interval (0.2 s) two ticks and the inter-removal interval (0.1 s) one tick.
pub const TICK_RATE: u64 = 10;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display/FFI, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Convert a duration in seconds to ticks, rounding up so a partial tick
/// still counts. Negative durations are treated as zero.
#[inline]
pub fn seconds_to_ticks(seconds: Fixed64) -> Ticks {
    let ticks = seconds.max(Fixed64::ZERO) * Fixed64::from_num(TICK_RATE);
    ticks.ceil().to_num::<u64>()
}

/// Whole seconds covering the given tick count, rounded up. Used for the
/// countdown display, which never shows 0 while time remains.
#[inline]
pub fn ticks_to_whole_seconds(ticks: Ticks) -> u64 {
    ticks.div_ceil(TICK_RATE)
}
