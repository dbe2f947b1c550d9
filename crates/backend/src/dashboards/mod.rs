pub mod d400_appointment_stats;
pub mod d401_year_comparison;
