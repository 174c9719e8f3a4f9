// Question distribution planning: request → ordered work items → totals.
// Pure code only; generation and lookups live in `generation` and `curriculum`.

pub mod aggregator;
pub mod planner;
