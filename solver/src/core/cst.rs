/// Type representing an integer constant.
pub type IntCst = i32;

/// Type used to store the result of operations on `IntCst` that may overflow.
pub type LongCst = i64;

/// Overflow tolerant max value for integer constants. All user supplied bounds
/// are clamped into the reserved range so that offset arithmetic performed by
/// propagators stays far from the representable limits.
pub const INT_CST_MAX: IntCst = IntCst::MAX / 100;

/// Overflow tolerant min value for integer constants.
pub const INT_CST_MIN: IntCst = -INT_CST_MAX;

/// Convert IntCst to LongCst.
pub const fn cst_int_to_long(cst: IntCst) -> LongCst {
    cst as LongCst
}

/// Convert LongCst to IntCst, clamping into the reserved range.
pub const fn cst_long_to_int(cst: LongCst) -> IntCst {
    let clamped = if cst > INT_CST_MAX as LongCst {
        INT_CST_MAX as LongCst
    } else if cst < INT_CST_MIN as LongCst {
        INT_CST_MIN as LongCst
    } else {
        cst
    };
    clamped as IntCst
}

/// Clamps a user supplied constant into the reserved range.
pub const fn clamped(cst: IntCst) -> IntCst {
    if cst > INT_CST_MAX {
        INT_CST_MAX
    } else if cst < INT_CST_MIN {
        INT_CST_MIN
    } else {
        cst
    }
}
