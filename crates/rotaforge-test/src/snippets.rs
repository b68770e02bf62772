//! Constraint code for the `x[entity, day, slot]` layout of [`crate::specs`].
//!
//! Entity loops use `staff`; pass the list name where a fixture uses another one.

/// Every slot is covered by between `lo` and `hi` entities.
pub fn coverage(lo: i64, hi: i64) -> String {
    coverage_of("staff", lo, hi)
}

/// [`coverage`] over an arbitrary entity list.
pub fn coverage_of(list: &str, lo: i64, hi: i64) -> String {
    format!(
        r#"for d in days {{
    for s in slots {{
        constrain "cover_lo_{{d}}_{{s}}": sum(e in {list}: x[e, d, s]) >= {lo};
        constrain "cover_hi_{{d}}_{{s}}": sum(e in {list}: x[e, d, s]) <= {hi};
    }}
}}"#
    )
}

/// Every slot needs at least `n` entities.
pub fn minimum_per_slot(list: &str, n: i64) -> String {
    format!(
        r#"for d in days {{
    for s in slots {{
        constrain "min_{n}_{{d}}_{{s}}": sum(e in {list}: x[e, d, s]) >= {n};
    }}
}}"#
    )
}

/// Nobody works more than one slot per day.
pub fn one_slot_per_day(list: &str) -> String {
    format!(
        r#"for e in {list} {{
    for d in days {{
        constrain "one_slot_{{e}}_{{d}}": sum(s in slots: x[e, d, s]) <= 1;
    }}
}}"#
    )
}

/// `entity` is off on `day`.
pub fn day_off(entity: &str, day: usize) -> String {
    format!(
        r#"constrain "off_{entity}_{day}": sum(s in slots: x["{entity}", {day}, s]) == 0;"#
    )
}

/// Each entity works at most `n` slots over the horizon.
pub fn max_total(list: &str, n: i64) -> String {
    format!(
        r#"for e in {list} {{
    constrain "max_total_{{e}}": sum(d in days, s in slots: x[e, d, s]) <= {n};
}}"#
    )
}

/// Code that parses but references a symbol no specification binds.
pub const UNKNOWN_SYMBOL: &str = "constrain sum(e in nurses: x[e, 0, 0]) >= 1;";

/// Code that does not parse.
pub const SYNTAX_ERROR: &str = "constrain x[0, 0 >= 1";

/// Code that adds nothing.
pub const NO_OP: &str = "let unused = 1;";
