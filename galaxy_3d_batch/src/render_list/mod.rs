//! Render list module: pooled render items and their ordering.

mod render_list;
mod sorting;

pub use render_list::{RenderItem, RenderList};
pub use sorting::{
    SortCallback, SortStrategy,
    quantize_depths, radix_sort, sort_opaque, sort_transparent,
};
