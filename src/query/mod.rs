//! Storage-independent query building: predicates from search conditions,
//! composed query descriptions, and pagination over an executor.

pub mod page;
pub mod predicate;
pub mod spec;

pub use page::{Page, PageRequest, paginate, paginate_counted};
pub use predicate::{Field, Predicate, Record, Relation, Value, build_predicates};
pub use spec::{
    Direction, JoinKind, JoinSpec, NullsOrder, ProjectionSpec, QuerySpec, SortSpec, compose,
};
