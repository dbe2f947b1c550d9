pub mod appointment_category;
