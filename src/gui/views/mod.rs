pub mod alert;
pub mod attendance;
pub mod calendar;
pub mod member_picker;
pub mod slot_detail;
