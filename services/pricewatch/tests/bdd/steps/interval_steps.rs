//! BDD step definitions for interval parsing and countdown formatting

use cucumber::{then, when};

use pricewatch::countdown::format_countdown;
use pricewatch::interval::parse_interval_ms;

use crate::world::PricewatchWorld;

#[when(expr = "the interval {string} is parsed")]
fn parse_interval(world: &mut PricewatchWorld, spec: String) {
    world.parsed_ms = Some(parse_interval_ms(&spec));
}

#[then(expr = "the interval should be {int} milliseconds")]
fn interval_is(world: &mut PricewatchWorld, expected: u64) {
    assert_eq!(world.parsed_ms, Some(expected));
}

#[when(expr = "{int} seconds are formatted as a countdown")]
fn format_seconds(world: &mut PricewatchWorld, seconds: u64) {
    world.formatted = Some(format_countdown(seconds));
}

#[then(expr = "the countdown text should be {string}")]
fn countdown_text_is(world: &mut PricewatchWorld, expected: String) {
    assert_eq!(world.formatted.as_deref(), Some(expected.as_str()));
}
