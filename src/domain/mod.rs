mod fields;
mod misery;
mod threads;
mod types;

pub use fields::{
    AGGREGATE_FUNCTIONS, SPECIAL_FIELD_SORT_KEYS, aggregate_alias, aggregate_sortable,
    get_sort_field, sortable_field_type, special_field_sort_key,
};
pub use misery::{MISERY_PALETTE_SIZE, MiseryScore, compute_misery, find_misery_field, misery_limit};
pub use threads::{
    DropdownEntry, dropdown_entries, thread_exception, thread_info, thread_label, trim_filename,
};
pub use types::{
    EventDetail, EventRow, ExceptionValue, FieldType, MetaTypes, Organization, ProjectLookup,
    ProjectRecord, Thread, ThreadFrame,
};
