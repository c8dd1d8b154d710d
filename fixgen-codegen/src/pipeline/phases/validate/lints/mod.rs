//! Built-in lints for graph validation.

mod complexity_budget;
mod indent_width;
mod sub_fixture_duplicate;
mod sub_fixture_name;
mod sub_fixture_reachable;
mod sub_fixture_root_kind;
mod tag_without_value;

pub use complexity_budget::ComplexityBudgetLint;
pub use indent_width::IndentWidthLint;
pub use sub_fixture_duplicate::SubFixtureDuplicateLint;
pub use sub_fixture_name::SubFixtureNameLint;
pub use sub_fixture_reachable::SubFixtureReachableLint;
pub use sub_fixture_root_kind::SubFixtureRootKindLint;
pub use tag_without_value::TagWithoutValueLint;
