//! Pure formatting helpers shared by the viewer and its report views.

pub mod bandwidth;
pub mod period;
pub mod querystring;
