/// Chart-ready tables built from reconstructed rows.
///
/// Everything here consumes `Vec<ReconstructedRow>` only; the raw dataset
/// is never consulted again once a year slice has been rebuilt.

pub mod aggregate;
pub mod hover;

pub use aggregate::{
    BubbleAxes, BubblePoint, CategoryTotal, RankedBar, any_imputed, bubble_points,
    category_totals, ranking_bars, top_n,
};
