mod filters;
mod params;
mod sort;
mod sql;

pub use filters::{build_filters, Condition, Filter, Scalar};
pub use params::{page_skip, ListParams};
pub use sort::{build_sort, parse_sort_spec, Sort, SortKey};
pub use sql::{push_filter, push_json, push_order_by};
