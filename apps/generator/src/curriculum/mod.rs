// Curriculum metadata: read-only lookups against the curriculum tables and
// the per-category hints derived for each work item.

pub mod handlers;
pub mod hints;
pub mod lookup;
