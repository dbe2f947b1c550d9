pub mod a001_appointment;
pub mod a002_commerce_order;
